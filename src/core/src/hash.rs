//! Hashing primitives over field words.

use crate::types::Field;
use sha2::{Digest, Sha256};

/// Two-input hash used for every internal tree node and hash-chain step.
///
/// `SHA-256(left || right)`, reduced into field range.
pub fn hash_pair(left: &Field, right: &Field) -> Field {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    Field::from_digest(digest)
}

/// Advances a transfer hash chain by one transfer.
///
/// `next = H(previous, H(destination, value))`
pub fn hash_chain_step(previous: &Field, destination: &Field, value: &Field) -> Field {
    hash_pair(previous, &hash_pair(destination, value))
}
