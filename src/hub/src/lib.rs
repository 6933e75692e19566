//! Aggregation root ledger for cross-chain teleports.
//!
//! The ledger lives on the home chain. It keeps one slot per registered chain
//! holding that chain's latest proved transfer root, folds all slots into a
//! single aggregation root and broadcasts `(root, sequence)` back to the
//! gateways.

pub mod errors;
pub mod events;
pub mod ledger;
pub mod registry;

// Re-export commonly used types
pub use errors::HubError;
pub use events::HubEvent;
pub use ledger::{AggregationRootLedger, BroadcastReceipt};
pub use registry::ChainRegistry;
