pub mod block;
pub mod chain;
pub mod clock;
pub mod constants;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod mine;
pub mod store;
pub mod verify;

pub use block::Block;
pub use chain::{BlockView, Chain, ChainConfig};
pub use clock::{Clock, FixedClock, SteppingClock, SystemClock, Timestamp};
pub use error::{LedgerError, Result};
pub use hash::hash;
pub use merkle::{merkle_root, MerkleProof, MerkleTree};
pub use mine::{mine, CancelToken, Miner, MinerConfig, Proof};
pub use store::ChainStore;
pub use verify::{verify, verify_strict, Violation};

pub mod pow {
    use crate::clock::Timestamp;
    use crate::hash::hash_concat;

    /// Candidate digest for one mining attempt:
    /// `transactions ‖ nonce ‖ tip_hash ‖ timestamp`, integers in decimal.
    pub fn candidate_digest<S: AsRef<str>>(
        transactions: &[S],
        nonce: i64,
        tip_hash: &str,
        timestamp: Timestamp,
    ) -> String {
        let nonce = nonce.to_string();
        let timestamp = timestamp.to_string();
        hash_concat(
            transactions
                .iter()
                .map(|t| t.as_ref())
                .chain([nonce.as_str(), tip_hash, timestamp.as_str()]),
        )
    }

    /// Inclusive range check under lexicographic string ordering.
    pub fn in_range(digest: &str, min: &str, max: &str) -> bool {
        min <= digest && digest <= max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_is_lexicographic_and_inclusive() {
        assert!(pow::in_range("0000", "0000", "ffff"));
        assert!(pow::in_range("ffff", "0000", "ffff"));
        assert!(pow::in_range("8000abcd", "0000", "ffff"));
        // longer strings sharing the bound as a prefix sort after it
        assert!(!pow::in_range("ffff0", "0000", "ffff"));
        assert!(!pow::in_range("a", "b", "c"));
    }

    #[test]
    fn candidate_digest_preimage() {
        let digest = pow::candidate_digest(&["C", "D"], 12, "abc", 99);
        assert_eq!(digest, hash("CD12abc99"));
    }

    #[test]
    fn candidate_digest_depends_on_every_input() {
        let base = pow::candidate_digest(&["C"], 1, "tip", 5);
        assert_ne!(base, pow::candidate_digest(&["D"], 1, "tip", 5));
        assert_ne!(base, pow::candidate_digest(&["C"], 2, "tip", 5));
        assert_ne!(base, pow::candidate_digest(&["C"], 1, "pit", 5));
        assert_ne!(base, pow::candidate_digest(&["C"], 1, "tip", 6));
    }
}
