//! Error types for the aggregation root ledger.

use teleport_core::errors::CoreError;
use teleport_core::types::EndpointId;
use teleport_network::errors::NetworkError;
use thiserror::Error;

/// Errors returned by [`crate::AggregationRootLedger`]. Every error aborts the
/// call without any state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The caller is not the owner.
    #[error("Unauthorized: 0x{} is not the owner", hex::encode(.0))]
    Unauthorized([u8; 32]),

    /// A required address was zero.
    #[error("Zero address for {0}")]
    ZeroAddress(&'static str),

    /// The registration carries chain id zero.
    #[error("Chain id must be non-zero")]
    ZeroChainId,

    /// The endpoint id is already registered.
    #[error("Endpoint {0} is already registered")]
    AlreadyRegistered(EndpointId),

    /// The aggregation tree has no free leaf.
    #[error("Registry is full: at most {0} chains")]
    CapacityExhausted(usize),

    /// The endpoint id is not registered.
    #[error("Endpoint {0} is not registered")]
    NotRegistered(EndpointId),

    /// The sender of an inbound message is not the configured peer.
    #[error("Untrusted sender 0x{} for endpoint {eid}", hex::encode(.sender))]
    UntrustedSender {
        /// Source endpoint
        eid: EndpointId,
        /// Claimed sender
        sender: [u8; 32],
    },

    /// A quote asked for payment in the transport's secondary fee token.
    #[error("Quote for endpoint {eid} requires {fee} in the secondary fee token")]
    UnsupportedFeeToken {
        /// Destination endpoint
        eid: EndpointId,
        /// Requested secondary-token fee
        fee: u128,
    },

    /// The supplied value does not cover the fees.
    #[error("Insufficient value: required {required}, supplied {supplied}")]
    InsufficientValue {
        /// Total quoted fee
        required: u128,
        /// Supplied value
        supplied: u128,
    },

    /// The summed fees do not fit in a `u128`.
    #[error("Fee total overflows")]
    FeeOverflow,

    /// Transport or payload failure.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Aggregation failure.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
