//! Core primitives for proof-gated cross-chain teleports.
//!
//! This crate provides the fundamental types shared by the aggregation root
//! ledger and the teleport gateways: 256-bit field words, the two-input hash,
//! the fixed-height aggregation tree with its precomputed zero hashes, and the
//! fixed-shape proofs accepted by the gateways.

pub mod errors;
pub mod hash;
pub mod merkle;
pub mod proofs;
pub mod types;

// Re-export commonly used types
pub use errors::CoreError;
pub use merkle::{aggregation_root, AGGREGATION_TREE_HEIGHT, MAX_LEAVES, ZERO_HASH_COUNT};
pub use proofs::{BatchTeleportProof, RootTransitionProof, SingleTeleportProof, TeleportClaim};
pub use types::{Address, Balance, ChainId, EndpointId, Field, RecipientDescriptor, TokenInfo};
