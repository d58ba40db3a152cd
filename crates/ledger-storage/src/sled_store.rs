use anyhow::{Context, Result};
use ledger_core::{Block, ChainConfig, ChainStore};
use sled::{Db, IVec};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";
const KEY_BLOCK_COUNT: &[u8] = b"block_count";
const KEY_CONFIG: &[u8] = b"chain_config";

#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: sled::Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("open sled db at {}", path.display()))?;
    let blocks = db.open_tree(TREE_BLOCKS)?;
    info!(path = %path.display(), "sled store opened");
    Ok(Self { db, blocks })
  }

  fn decode_u64(v: &IVec) -> Result<u64> {
    let arr: [u8; 8] = v
      .as_ref()
      .try_into()
      .context("stored block count is not 8 bytes")?;
    Ok(u64::from_be_bytes(arr))
  }
}

impl ChainStore for SledStore {
  fn put_block(&self, index: u64, block: &Block) -> Result<()> {
    let bytes = bincode::serialize(block)?;
    self.blocks.insert(index.to_be_bytes(), bytes)?;

    // blocks are contiguous from 0, so the count is one past the highest index
    let count = self.block_count()?.max(index + 1);
    self.db.insert(KEY_BLOCK_COUNT, &count.to_be_bytes())?;

    self.db.flush()?;
    debug!(index, hash = %block.current_hash, "block stored");
    Ok(())
  }

  fn get_block(&self, index: u64) -> Result<Option<Block>> {
    self
      .blocks
      .get(index.to_be_bytes())?
      .map(|ivec| {
        bincode::deserialize(&ivec).with_context(|| format!("decode block {index}"))
      })
      .transpose()
  }

  fn block_count(&self) -> Result<u64> {
    self
      .db
      .get(KEY_BLOCK_COUNT)?
      .map(|v| Self::decode_u64(&v))
      .transpose()
      .map(|count| count.unwrap_or(0))
  }

  fn put_config(&self, config: &ChainConfig) -> Result<()> {
    let bytes = bincode::serialize(config)?;
    self.db.insert(KEY_CONFIG, bytes)?;
    self.db.flush()?;
    Ok(())
  }

  fn get_config(&self) -> Result<Option<ChainConfig>> {
    self
      .db
      .get(KEY_CONFIG)?
      .map(|ivec| bincode::deserialize(&ivec).context("decode chain config"))
      .transpose()
  }

  fn clear(&self) -> Result<()> {
    self.blocks.clear()?;
    self.db.remove(KEY_BLOCK_COUNT)?;
    self.db.remove(KEY_CONFIG)?;
    self.db.flush()?;
    Ok(())
  }

  fn close(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}
