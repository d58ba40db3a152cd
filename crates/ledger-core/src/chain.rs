use crate::block::Block;
use crate::clock::Timestamp;
use crate::constants::{DEFAULT_MAX_HASH, DEFAULT_MIN_HASH, DEFAULT_TRANSACTIONS_PER_BLOCK};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Chain-level settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Batching hint for callers. Not enforced by the chain.
    pub transactions_per_block: usize,
    /// Inclusive lower bound for accepted mining digests.
    pub min_hash: String,
    /// Inclusive upper bound for accepted mining digests.
    pub max_hash: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            transactions_per_block: DEFAULT_TRANSACTIONS_PER_BLOCK,
            min_hash: DEFAULT_MIN_HASH.to_string(),
            max_hash: DEFAULT_MAX_HASH.to_string(),
        }
    }
}

impl ChainConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parse chain config")
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read chain config {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn hash_range_is_valid(&self) -> bool {
        self.min_hash <= self.max_hash
    }

    /// Whether `digest` falls in `[min_hash, max_hash]` under string ordering.
    pub fn accepts(&self, digest: &str) -> bool {
        crate::pow::in_range(digest, &self.min_hash, &self.max_hash)
    }
}

/// An ordered, append-only sequence of blocks. Index 0 is genesis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    blocks: Vec<Block>,
    config: ChainConfig,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            blocks: Vec::new(),
            config,
        }
    }

    pub(crate) fn from_parts(blocks: Vec<Block>, config: ChainConfig) -> Self {
        Self { blocks, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn set_transactions_per_block(&mut self, n: usize) {
        self.config.transactions_per_block = n;
    }

    pub fn set_hash_range(&mut self, min: impl Into<String>, max: impl Into<String>) {
        self.config.min_hash = min.into();
        self.config.max_hash = max.into();
    }

    /// Add a block to the end of the chain. Cross-block consistency is only
    /// checked by [`Chain::check`].
    pub fn append(&mut self, block: Block) {
        debug!(
            index = self.blocks.len(),
            hash = %block.current_hash,
            "appending block"
        );
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Mutable access for [`Block::change_transaction`]. Callers own the
    /// consequences for verification.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Read-only view of every block, in chain order.
    pub fn iter(&self) -> impl Iterator<Item = BlockView<'_>> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockView::new(index, block))
    }

    pub fn view(&self) -> Vec<BlockView<'_>> {
        self.iter().collect()
    }
}

/// Display-oriented projection of a block and its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockView<'a> {
    pub index: usize,
    pub transactions: &'a [String],
    pub nonce: i64,
    pub previous_hash: &'a str,
    pub merkle_root: &'a str,
    pub current_hash: &'a str,
    pub timestamp: Timestamp,
}

impl<'a> BlockView<'a> {
    fn new(index: usize, block: &'a Block) -> Self {
        Self {
            index,
            transactions: &block.transactions,
            nonce: block.nonce,
            previous_hash: &block.previous_hash,
            merkle_root: &block.merkle_root,
            current_hash: &block.current_hash,
            timestamp: block.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_config() {
        let config = ChainConfig::default();
        assert_eq!(config.transactions_per_block, 4);
        assert_eq!(config.min_hash, "0000");
        assert_eq!(config.max_hash, "ffff");
        assert!(config.hash_range_is_valid());
    }

    #[test]
    fn config_from_partial_json_uses_defaults() {
        let config = ChainConfig::from_json_str(r#"{"max_hash":"0fff"}"#).unwrap();
        assert_eq!(config.max_hash, "0fff");
        assert_eq!(config.min_hash, "0000");
        assert_eq!(config.transactions_per_block, 4);
    }

    #[test]
    fn config_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(
            &path,
            r#"{"transactions_per_block":2,"min_hash":"00","max_hash":"7f"}"#,
        )
        .unwrap();
        let config = ChainConfig::from_json_file(&path).unwrap();
        assert_eq!(config.transactions_per_block, 2);
        assert_eq!(config.min_hash, "00");
        assert_eq!(config.max_hash, "7f");
    }

    #[test]
    fn config_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ChainConfig::from_json_file(dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn setters_do_not_validate() {
        let mut chain = Chain::new();
        chain.set_transactions_per_block(0);
        chain.set_hash_range("ffff", "0000");
        assert_eq!(chain.config().transactions_per_block, 0);
        assert!(!chain.config().hash_range_is_valid());
    }

    #[test]
    fn append_preserves_order_and_tip() {
        let mut chain = Chain::new();
        assert!(chain.tip().is_none());
        let genesis = Block::genesis(txs(&["A"]), 1);
        let next = Block::new(&chain, txs(&["B"]), 1, "bogus", 0).unwrap();
        chain.append(genesis.clone());
        chain.append(next.clone());
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.block(0), Some(&genesis));
        assert_eq!(chain.tip(), Some(&next));
    }

    #[test]
    fn view_enumerates_in_order() {
        let mut chain = Chain::new();
        chain.append(Block::genesis(txs(&["A", "B"]), 10));
        let tip = chain.tip().unwrap().current_hash.clone();
        chain.append(Block::new(&chain, txs(&["C"]), 3, tip.clone(), 20).unwrap());

        let view = chain.view();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].index, 0);
        assert_eq!(view[0].previous_hash, "0");
        assert_eq!(view[1].index, 1);
        assert_eq!(view[1].transactions, ["C".to_string()].as_slice());
        assert_eq!(view[1].previous_hash, tip);
        assert_eq!(view[1].nonce, 3);
        assert_eq!(view[1].timestamp, 20);
    }

    #[test]
    fn block_mut_allows_tamper() {
        let mut chain = Chain::new();
        chain.append(Block::genesis(txs(&["A"]), 1));
        chain.block_mut(0).unwrap().change_transaction(0, "B");
        assert_eq!(chain.blocks()[0].transactions, txs(&["B"]));
        assert!(chain.block_mut(1).is_none());
    }
}
