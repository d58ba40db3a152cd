use crate::chain::Chain;
use crate::clock::Timestamp;
use crate::constants::{GENESIS_NONCE, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result};
use crate::hash::hash_concat;
use crate::merkle::merkle_root;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One sealed unit of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<String>,
    pub nonce: i64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub current_hash: String,
    /// Nanoseconds since the UNIX epoch, supplied by the caller.
    pub timestamp: Timestamp,
}

impl Block {
    /// Build and seal a block destined for `chain`.
    ///
    /// An empty `previous_hash` is only accepted while `chain` is empty, in
    /// which case it becomes the genesis sentinel `"0"`. The block is not
    /// appended.
    pub fn new(
        chain: &Chain,
        transactions: Vec<String>,
        nonce: i64,
        previous_hash: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<Self> {
        if nonce < 0 {
            return Err(LedgerError::InvalidNonce(nonce));
        }

        let mut previous_hash = previous_hash.into();
        if previous_hash.is_empty() {
            if !chain.is_empty() {
                return Err(LedgerError::MissingPreviousHash);
            }
            previous_hash = GENESIS_PREVIOUS_HASH.to_string();
        }

        Ok(Self::sealed(transactions, nonce, previous_hash, timestamp))
    }

    /// A genesis block: sentinel previous hash and zero nonce.
    pub fn genesis(transactions: Vec<String>, timestamp: Timestamp) -> Self {
        Self::sealed(
            transactions,
            GENESIS_NONCE,
            GENESIS_PREVIOUS_HASH.to_string(),
            timestamp,
        )
    }

    fn sealed(
        transactions: Vec<String>,
        nonce: i64,
        previous_hash: String,
        timestamp: Timestamp,
    ) -> Self {
        let merkle_root = merkle_root(&transactions);
        let current_hash = seal_digest(
            &transactions,
            nonce,
            &previous_hash,
            &merkle_root,
            timestamp,
        );
        debug!(nonce, %current_hash, txs = transactions.len(), "sealed block");
        Self {
            transactions,
            nonce,
            previous_hash,
            merkle_root,
            current_hash,
            timestamp,
        }
    }

    /// Recompute the seal from the block's current fields.
    pub fn compute_hash(&self) -> String {
        seal_digest(
            &self.transactions,
            self.nonce,
            &self.previous_hash,
            &self.merkle_root,
            self.timestamp,
        )
    }

    /// Recompute the Merkle root over the block's current transactions.
    pub fn compute_merkle_root(&self) -> String {
        merkle_root(&self.transactions)
    }

    pub fn is_sealed(&self) -> bool {
        self.current_hash == self.compute_hash()
    }

    /// Overwrite the transaction at `index` and re-seal `current_hash`.
    ///
    /// `merkle_root` is left as it was, so the block no longer matches its
    /// root afterwards.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn change_transaction(&mut self, index: usize, value: impl Into<String>) {
        self.transactions[index] = value.into();
        self.current_hash = self.compute_hash();
        debug!(index, current_hash = %self.current_hash, "transaction changed, block re-sealed");
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH && self.nonce == GENESIS_NONCE
    }
}

/// Seal digest over `transactions ‖ nonce ‖ previous_hash ‖ merkle_root ‖ timestamp`.
///
/// Transactions are concatenated without a separator and the integers are
/// rendered in decimal.
pub fn seal_digest<S: AsRef<str>>(
    transactions: &[S],
    nonce: i64,
    previous_hash: &str,
    merkle_root: &str,
    timestamp: Timestamp,
) -> String {
    let nonce = nonce.to_string();
    let timestamp = timestamp.to_string();
    hash_concat(
        transactions
            .iter()
            .map(|t| t.as_ref())
            .chain([nonce.as_str(), previous_hash, merkle_root, timestamp.as_str()]),
    )
}
