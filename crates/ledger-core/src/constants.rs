pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_NONCE: i64 = 0;
pub const DEFAULT_TRANSACTIONS_PER_BLOCK: usize = 4;
pub const DEFAULT_MIN_HASH: &str = "0000";
pub const DEFAULT_MAX_HASH: &str = "ffff";
