//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error when a fixed-width input has the wrong length.
    #[error("Invalid length for {what}: expected {expected}, got {actual}")]
    InvalidLength {
        /// What was being decoded
        what: &'static str,
        /// The required length
        expected: usize,
        /// The supplied length
        actual: usize,
    },

    /// Error when a field word does not fit the integer it is decoded into.
    #[error("Field word {value} does not fit into {target}")]
    IntegerOverflow {
        /// Hex rendering of the offending word
        value: String,
        /// The integer type being decoded
        target: &'static str,
    },

    /// Error when more leaves are supplied than the tree can hold.
    #[error("Too many leaves: {count} exceeds capacity {capacity}")]
    TooManyLeaves {
        /// The number of leaves supplied
        count: usize,
        /// The tree capacity
        capacity: usize,
    },
}
