use crate::block::Block;
use crate::chain::{Chain, ChainConfig};
use anyhow::{bail, Result};
use tracing::info;

/// Trait the storage backends implement so a chain can be saved and reloaded.
/// This lives in `ledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    fn put_block(&self, index: u64, block: &Block) -> Result<()>;
    fn get_block(&self, index: u64) -> Result<Option<Block>>;
    /// Number of stored blocks. Blocks occupy indices `0..block_count()`.
    fn block_count(&self) -> Result<u64>;
    fn put_config(&self, config: &ChainConfig) -> Result<()>;
    fn get_config(&self) -> Result<Option<ChainConfig>>;
    fn clear(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}

impl Chain {
    /// Rebuild a chain from a store. A store without a saved config yields the
    /// default config.
    pub fn load<S: ChainStore + ?Sized>(store: &S) -> Result<Self> {
        let count = store.block_count()?;
        let mut blocks = Vec::with_capacity(count as usize);
        for index in 0..count {
            match store.get_block(index)? {
                Some(block) => blocks.push(block),
                None => bail!("store is missing block {index} of {count}"),
            }
        }
        let config = store.get_config()?.unwrap_or_default();
        info!(blocks = blocks.len(), "chain loaded from store");
        Ok(Chain::from_parts(blocks, config))
    }

    /// Replace whatever `store` holds with this chain's blocks and config.
    pub fn save<S: ChainStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.clear()?;
        store.put_config(self.config())?;
        for (index, block) in self.blocks().iter().enumerate() {
            store.put_block(index as u64, block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemStore {
        blocks: Mutex<BTreeMap<u64, Block>>,
        config: Mutex<Option<ChainConfig>>,
    }

    impl ChainStore for MemStore {
        fn put_block(&self, index: u64, block: &Block) -> Result<()> {
            self.blocks.lock().unwrap().insert(index, block.clone());
            Ok(())
        }

        fn get_block(&self, index: u64) -> Result<Option<Block>> {
            Ok(self.blocks.lock().unwrap().get(&index).cloned())
        }

        fn block_count(&self) -> Result<u64> {
            Ok(self.blocks.lock().unwrap().len() as u64)
        }

        fn put_config(&self, config: &ChainConfig) -> Result<()> {
            *self.config.lock().unwrap() = Some(config.clone());
            Ok(())
        }

        fn get_config(&self) -> Result<Option<ChainConfig>> {
            Ok(self.config.lock().unwrap().clone())
        }

        fn clear(&self) -> Result<()> {
            self.blocks.lock().unwrap().clear();
            *self.config.lock().unwrap() = None;
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut chain = Chain::new();
        chain.set_hash_range("00", "7f");
        chain.append(Block::genesis(vec!["A".into(), "B".into()], 1));
        let tip = chain.tip().unwrap().current_hash.clone();
        chain.append(Block::new(&chain, vec!["C".into()], 9, tip, 2).unwrap());

        let store = MemStore::default();
        chain.save(&store).unwrap();
        let loaded = Chain::load(&store).unwrap();
        assert_eq!(loaded, chain);
        assert!(loaded.check().is_ok());
    }

    #[test]
    fn save_shorter_chain_replaces_longer_one() {
        let mut long = Chain::new();
        long.append(Block::genesis(vec!["A".into()], 1));
        for i in 0..3u64 {
            let tip = long.tip().unwrap().current_hash.clone();
            long.append(Block::new(&long, vec![format!("t{i}")], 1, tip, 2 + i).unwrap());
        }
        let mut short = Chain::new();
        short.append(Block::genesis(vec!["B".into()], 1));

        let store = MemStore::default();
        long.save(&store).unwrap();
        short.save(&store).unwrap();

        assert_eq!(store.block_count().unwrap(), 1);
        assert_eq!(Chain::load(&store).unwrap(), short);
    }

    #[test]
    fn load_empty_store_gives_default_chain() {
        let store = MemStore::default();
        let chain = Chain::load(&store).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.config(), &ChainConfig::default());
    }

    #[test]
    fn load_with_gap_errors() {
        let store = MemStore::default();
        store
            .put_block(1, &Block::genesis(vec!["A".into()], 1))
            .unwrap();
        assert!(Chain::load(&store).is_err());
    }
}
