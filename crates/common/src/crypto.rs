//! Cryptographic utilities shared across Greenlight crates
//!
//! Opaque tokens are stored as SHA-256 digests of their plaintext; the
//! plaintext itself is never persisted.

use sha2::{Digest, Sha256};

/// Length in bytes of a token digest
pub const DIGEST_LEN: usize = 32;

/// One-way digest of a token plaintext
pub fn token_digest(plaintext: &str) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hasher.finalize().into()
}

/// Compare two byte strings in constant time with respect to their content.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
