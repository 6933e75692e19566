//! Proof-gated teleport gateway.
//!
//! A gateway sits next to one chain's token ledger. It snapshots the ledger's
//! transfer hash chain, advances a proved transfer root behind a proof oracle,
//! relays that root to the aggregation root ledger, stores the aggregation
//! roots broadcast back, and mints teleported value against either root
//! history.

pub mod errors;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod verifier;

// Re-export commonly used types
pub use errors::{GatewayError, LedgerError};
pub use events::GatewayEvent;
pub use gateway::{GatewayConfig, GatewayState, ProveOutcome, TeleportGateway, TeleportReceipt};
pub use ledger::{MemoryLedger, SourceLedger};
pub use verifier::{ProofVerifier, SealVerifier, StaticVerifier, VerifierKind, VerifierSet, VerifierSlot};
