use thiserror::Error;

/// Errors returned by block construction and the miner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("nonce must be non-negative, got {0}")]
    InvalidNonce(i64),

    #[error("previous hash must not be empty once the chain has a genesis block")]
    MissingPreviousHash,

    #[error("chain has no blocks to mine on top of")]
    EmptyChain,

    #[error("hash range is inverted: min {min} > max {max}")]
    InvalidHashRange { min: String, max: String },

    #[error("mining cancelled")]
    MiningCancelled,

    #[error("mining timed out after {attempts} attempts")]
    MiningTimedOut { attempts: u64 },

    #[error("no nonce accepted within {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
