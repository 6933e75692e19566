//! Events recorded by a teleport gateway.

use teleport_core::types::{Address, Balance, Field};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    HashChainReserved { index: u64, hash_chain: Field },
    TransferRootProved { index: u64, root: Field },
    /// Two valid proofs disagreed about the root at `index`. The gateway paused.
    TransferRootConflict { index: u64, stored: Field, proposed: Field },
    TransferRootRelayed { index: u64, root: Field, guid: Field },
    GlobalRootReceived { agg_seq: u64, root: Field, stored: bool },
    Teleported {
        recipient: Field,
        to: Address,
        amount: Balance,
        total: Balance,
    },
    EmergencyActivated,
    EmergencyDeactivated,
    VerifiersUpdated,
}
