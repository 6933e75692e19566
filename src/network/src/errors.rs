/// Error types for the network crate.
use std::fmt;
use std::error::Error as StdError;
use teleport_core::types::EndpointId;

/// Errors that can occur in the network crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Error when a payload does not have the fixed width of its message.
    InvalidPayload {
        /// The message being decoded
        what: &'static str,
        /// The required width
        expected: usize,
        /// The supplied width
        actual: usize,
    },

    /// Error when a payload field does not fit its integer type.
    InvalidMessage(String),

    /// Error when the supplied fee does not cover the quote.
    InsufficientFee {
        /// The quoted native fee
        required: u128,
        /// The supplied native fee
        supplied: u128,
    },

    /// Error when a message is sent to the sending endpoint itself.
    UnknownDestination(EndpointId),

    /// Error when the channel to the relayer is closed.
    ChannelClosed,

    /// Error when the transport's shared state is unusable.
    TransportError(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidPayload { what, expected, actual } => write!(
                f,
                "Invalid {} payload: expected {} bytes, got {}",
                what, expected, actual
            ),
            NetworkError::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
            NetworkError::InsufficientFee { required, supplied } => write!(
                f,
                "Insufficient fee: required {}, supplied {}",
                required, supplied
            ),
            NetworkError::UnknownDestination(eid) => write!(f, "Unknown destination endpoint: {}", eid),
            NetworkError::ChannelClosed => write!(f, "Relayer channel closed"),
            NetworkError::TransportError(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl StdError for NetworkError {}
