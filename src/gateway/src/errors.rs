//! Error types for the gateway crate.

use teleport_core::errors::CoreError;
use teleport_core::types::{Address, Balance, ChainId, EndpointId, Field};
use teleport_network::errors::NetworkError;
use thiserror::Error;

/// Errors raised by a [`crate::SourceLedger`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Only the gateway may mint.
    #[error("Unauthorized minter 0x{}", hex::encode(.0))]
    UnauthorizedMinter(Address),

    /// The sender cannot cover the transfer.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Balance, available: Balance },

    /// Zero-value transfers are not recorded.
    #[error("Amount must be non-zero")]
    ZeroAmount,

    /// A balance or counter would overflow.
    #[error("Overflow in {0}")]
    Overflow(&'static str),
}

/// Errors returned by [`crate::TeleportGateway`].
///
/// Every error aborts the call without any state change. A proof conflict is
/// not an error: it pauses the gateway and the call succeeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Proof-gated calls are refused while paused.
    #[error("Gateway is paused")]
    Paused,

    /// The proof oracle rejected the proof.
    #[error("Invalid proof")]
    InvalidProof,

    /// No proved root is stored at the proof's old index.
    #[error("No proved root at old index {0}")]
    OldRootZero(u64),

    /// The proof's old root is not the stored one.
    #[error("Old root mismatch: expected {expected}, supplied {supplied}")]
    OldRootMismatch { expected: Field, supplied: Field },

    /// No hash chain was reserved at the proof's new index.
    #[error("No hash chain reserved at index {0}")]
    ReserveHashChainNotFound(u64),

    /// The proof's new hash chain is not the reserved one.
    #[error("New hash chain mismatch: expected {expected}, supplied {supplied}")]
    NewHashChainMismatch { expected: Field, supplied: Field },

    /// A batch proof does not start at leaf zero.
    #[error("Initial leaf index must be zero, got {0}")]
    InvalidInitialLeafIndex(Field),

    /// A batch proof does not start from a zero cumulative value.
    #[error("Initial cumulative value must be zero, got {0}")]
    InvalidInitialCumulativeValue(Field),

    /// A batch proof's final root differs from its initial root.
    #[error("Final transfer root mismatch: expected {expected}, supplied {supplied}")]
    FinalRootMismatch { expected: Field, supplied: Field },

    /// A batch proof's final recipient differs from its initial recipient.
    #[error("Final recipient mismatch: expected {expected}, supplied {supplied}")]
    FinalRecipientMismatch { expected: Field, supplied: Field },

    /// No root is known under the hint.
    #[error("No root at index {index} (global: {is_global})")]
    ExpectedRootZero { is_global: bool, index: u64 },

    /// The proof's transfer root is not the one under the hint.
    #[error("Transfer root mismatch: expected {expected}, supplied {supplied}")]
    TransferRootMismatch { expected: Field, supplied: Field },

    /// The recipient descriptor does not open the proof's commitment.
    #[error("Recipient mismatch: expected {expected}, supplied {supplied}")]
    RecipientMismatch { expected: Field, supplied: Field },

    /// The recipient targets another chain.
    #[error("Invalid recipient chain id: expected {expected}, supplied {supplied}")]
    InvalidRecipientChainId { expected: ChainId, supplied: ChainId },

    /// The recipient has already received everything proven.
    #[error("Nothing to withdraw: proven {proven}, already teleported {teleported}")]
    NothingToWithdraw { proven: Balance, teleported: Balance },

    /// Nothing has been proved at the latest proved index.
    #[error("No proved root to relay")]
    NoProvedRoot,

    /// The supplied value does not cover the relay fee.
    #[error("Insufficient message value: required {required}, supplied {supplied}")]
    InsufficientMsgValue { required: u128, supplied: u128 },

    /// The caller is not the owner.
    #[error("Unauthorized: 0x{} is not the owner", hex::encode(.0))]
    Unauthorized(Address),

    /// A required address was zero.
    #[error("Zero address for {0}")]
    ZeroAddress(&'static str),

    /// An inbound message did not come from the hub.
    #[error("Untrusted source 0x{} on endpoint {eid}", hex::encode(.sender))]
    UntrustedSource { eid: EndpointId, sender: Address },

    /// Proof decoding failure.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Transport or payload failure.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The source ledger refused an operation.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
