//! Fixed-height Merkle aggregation over per-chain transfer roots.

use crate::errors::CoreError;
use crate::hash::hash_pair;
use crate::types::Field;
use lazy_static::lazy_static;

/// Height of the aggregation tree.
pub const AGGREGATION_TREE_HEIGHT: usize = 5;

/// Maximum number of chains the aggregation tree can hold.
pub const MAX_LEAVES: usize = 1 << AGGREGATION_TREE_HEIGHT;

/// Number of precomputed empty-subtree hashes (levels `0..=height`).
pub const ZERO_HASH_COUNT: usize = AGGREGATION_TREE_HEIGHT + 1;

/// Height of each chain's local transfer tree.
pub const TRANSFER_TREE_HEIGHT: usize = 32;

lazy_static! {
    /// Pre-computed zero hashes for each level of the aggregation tree.
    /// Level 0 is the empty leaf, level `i + 1` is `H(zero[i], zero[i])`.
    pub static ref AGGREGATION_ZERO_HASHES: Vec<Field> = compute_zero_hashes(ZERO_HASH_COUNT);
}

/// Computes `count` empty-subtree hashes starting from the zero leaf.
pub fn compute_zero_hashes(count: usize) -> Vec<Field> {
    let mut hashes = Vec::with_capacity(count);
    let mut current = Field::ZERO;
    for _ in 0..count {
        hashes.push(current);
        current = hash_pair(&current, &current);
    }
    hashes
}

/// Returns the root of an empty tree of the given height.
pub fn empty_root(height: usize) -> Field {
    let mut current = Field::ZERO;
    for _ in 0..height {
        current = hash_pair(&current, &current);
    }
    current
}

/// Computes the root of a tree of `height` levels over `leaves`.
///
/// Leaves past `leaves.len()` are implicitly zero. Whenever a node's pairing
/// partner is an empty subtree, `zero_hashes[level]` is used instead of
/// hashing zeros all the way up, which yields the same root as naive padding.
pub fn merkle_root(leaves: &[Field], height: usize, zero_hashes: &[Field]) -> Result<Field, CoreError> {
    let capacity = 1usize << height;
    if leaves.len() > capacity {
        return Err(CoreError::TooManyLeaves {
            count: leaves.len(),
            capacity,
        });
    }
    if zero_hashes.len() <= height {
        return Err(CoreError::InvalidLength {
            what: "zero hash table",
            expected: height + 1,
            actual: zero_hashes.len(),
        });
    }

    let mut layer: Vec<Field> = leaves.to_vec();
    for level in 0..height {
        if layer.is_empty() {
            break;
        }
        if layer.len() % 2 == 1 {
            layer.push(zero_hashes[level]);
        }
        layer = layer
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    // An empty layer means the whole tree is empty
    Ok(layer.first().copied().unwrap_or(zero_hashes[height]))
}

/// Computes the aggregation root over the registered chains' transfer roots.
pub fn aggregation_root(leaves: &[Field]) -> Result<Field, CoreError> {
    merkle_root(leaves, AGGREGATION_TREE_HEIGHT, &AGGREGATION_ZERO_HASHES)
}
