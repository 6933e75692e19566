//! Messaging transport binding for cross-chain teleports.
//!
//! This crate turns a generic one-way cross-chain message channel into the two
//! concrete messages the protocol uses: the gateway-to-hub root update and the
//! hub-to-gateway global root broadcast. It also ships two transports: an
//! in-memory bus driven by hand in tests, and a tokio channel consumed by an
//! asynchronous relayer.

pub mod channel;
pub mod errors;
pub mod memory;
pub mod transport;
pub mod types;

// Re-export commonly used types and functions
pub use channel::ChannelTransport;
pub use errors::NetworkError;
pub use memory::{BusEndpoint, MessageBus};
pub use transport::{FeeSchedule, Transport};
pub use types::{GlobalRootMsg, MessagingFee, MessagingReceipt, Origin, Packet, RootUpdateMsg};
