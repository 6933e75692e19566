//! Error types for the devnet node.

use std::error::Error as StdError;
use std::fmt;
use teleport_core::types::EndpointId;
use teleport_gateway::errors::GatewayError;
use teleport_hub::errors::HubError;
use teleport_network::errors::NetworkError;

/// Errors that can occur in the devnet node.
#[derive(Debug)]
pub enum NodeError {
    /// Error when a hub operation fails.
    HubError(HubError),

    /// Error when a gateway operation fails.
    GatewayError(GatewayError),

    /// Error when a transport operation fails.
    NetworkError(NetworkError),

    /// Error when a packet targets an endpoint nobody serves.
    UnknownEndpoint(EndpointId),

    /// Error when a state machine lock was poisoned by a panicking holder.
    LockPoisoned(&'static str),

    /// Error when a metrics operation fails.
    MetricsError(String),

    /// Error when a configuration operation fails.
    ConfigError(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::HubError(e) => write!(f, "Hub error: {}", e),
            NodeError::GatewayError(e) => write!(f, "Gateway error: {}", e),
            NodeError::NetworkError(e) => write!(f, "Network error: {}", e),
            NodeError::UnknownEndpoint(eid) => write!(f, "Unknown endpoint: {}", eid),
            NodeError::LockPoisoned(what) => write!(f, "Lock poisoned: {}", what),
            NodeError::MetricsError(msg) => write!(f, "Metrics error: {}", msg),
            NodeError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl StdError for NodeError {}

impl From<HubError> for NodeError {
    fn from(error: HubError) -> Self {
        NodeError::HubError(error)
    }
}

impl From<GatewayError> for NodeError {
    fn from(error: GatewayError) -> Self {
        NodeError::GatewayError(error)
    }
}

impl From<NetworkError> for NodeError {
    fn from(error: NetworkError) -> Self {
        NodeError::NetworkError(error)
    }
}
