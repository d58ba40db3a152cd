//! SHA-256 hashing rendered as lowercase hex.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes and return the 64-character lowercase hex digest.
#[inline]
pub fn hash(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Hash several parts as if they had been concatenated first.
pub fn hash_concat<I, P>(parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hex::encode(hasher.finalize())
}
