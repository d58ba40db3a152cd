//! Whole-chain integrity checks.
//!
//! Checks run in a fixed order and stop at the first failure:
//! empty chain, genesis shape, genesis Merkle root, then for each later block
//! the predecessor link, nonce sign, Merkle root and timestamp order.

use crate::block::Block;
use crate::chain::Chain;
use crate::constants::{GENESIS_NONCE, GENESIS_PREVIOUS_HASH};
use thiserror::Error;
use tracing::warn;

/// The first integrity violation found in a chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("chain is empty")]
    EmptyChain,

    #[error("genesis block must have previous hash \"0\" and nonce 0 (got {previous_hash:?}, {nonce})")]
    MalformedGenesis { previous_hash: String, nonce: i64 },

    #[error("block {index} does not link to its predecessor's hash")]
    BrokenLink { index: usize },

    #[error("block {index} has negative nonce {nonce}")]
    NegativeNonce { index: usize, nonce: i64 },

    #[error("block {index} merkle root does not match its transactions")]
    MerkleMismatch { index: usize },

    #[error("block {index} is timestamped before its predecessor")]
    TimestampRegression { index: usize },

    #[error("block {index} hash does not match its contents")]
    SealMismatch { index: usize },
}

impl Violation {
    /// Index of the offending block, if the violation is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Violation::EmptyChain => None,
            Violation::MalformedGenesis { .. } => Some(0),
            Violation::BrokenLink { index }
            | Violation::NegativeNonce { index, .. }
            | Violation::MerkleMismatch { index }
            | Violation::TimestampRegression { index }
            | Violation::SealMismatch { index } => Some(*index),
        }
    }
}

impl Chain {
    /// Check the chain and report the first violation.
    pub fn check(&self) -> Result<(), Violation> {
        self.walk(false)
    }

    /// Like [`Chain::check`], and additionally require every block's stored
    /// hash to equal its recomputed seal.
    pub fn check_strict(&self) -> Result<(), Violation> {
        self.walk(true)
    }

    fn walk(&self, seals: bool) -> Result<(), Violation> {
        let result = check_blocks(self.blocks(), seals);
        if let Err(violation) = &result {
            warn!(%violation, "chain verification failed");
        }
        result
    }
}

fn check_blocks(blocks: &[Block], seals: bool) -> Result<(), Violation> {
    let genesis = blocks.first().ok_or(Violation::EmptyChain)?;

    if genesis.previous_hash != GENESIS_PREVIOUS_HASH || genesis.nonce != GENESIS_NONCE {
        return Err(Violation::MalformedGenesis {
            previous_hash: genesis.previous_hash.clone(),
            nonce: genesis.nonce,
        });
    }
    if genesis.compute_merkle_root() != genesis.merkle_root {
        return Err(Violation::MerkleMismatch { index: 0 });
    }
    if seals && !genesis.is_sealed() {
        return Err(Violation::SealMismatch { index: 0 });
    }

    for (index, pair) in blocks.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        let index = index + 1;

        if block.previous_hash != prev.current_hash {
            return Err(Violation::BrokenLink { index });
        }
        if block.nonce < 0 {
            return Err(Violation::NegativeNonce {
                index,
                nonce: block.nonce,
            });
        }
        if block.compute_merkle_root() != block.merkle_root {
            return Err(Violation::MerkleMismatch { index });
        }
        if block.timestamp < prev.timestamp {
            return Err(Violation::TimestampRegression { index });
        }
        if seals && !block.is_sealed() {
            return Err(Violation::SealMismatch { index });
        }
    }

    Ok(())
}

/// `true` when the chain passes every check of [`Chain::check`].
pub fn verify(chain: &Chain) -> bool {
    chain.check().is_ok()
}

/// `true` when the chain passes every check of [`Chain::check_strict`].
pub fn verify_strict(chain: &Chain) -> bool {
    chain.check_strict().is_ok()
}
