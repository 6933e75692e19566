//! Events recorded by the aggregation root ledger.

use std::fmt;
use teleport_core::types::{Address, EndpointId, Field, TokenInfo};

/// Something observable happened on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubEvent {
    /// A chain joined at the given 1-based position.
    TokenRegistered { position: usize, info: TokenInfo },
    /// A registration was replaced in place.
    TokenUpdated { info: TokenInfo },
    /// The trusted peer of an endpoint changed.
    PeerSet { eid: EndpointId, peer: Address },
    /// A gateway reported a root.
    RootUpdated {
        eid: EndpointId,
        root: Field,
        index: u64,
        changed: bool,
    },
    /// An aggregation root was sent out.
    Broadcast {
        root: Field,
        agg_seq: u64,
        targets: Vec<EndpointId>,
    },
    /// Ownership moved to a new account.
    OwnershipTransferred { previous: Address, owner: Address },
}

impl fmt::Display for HubEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubEvent::TokenRegistered { position, info } => {
                write!(f, "TokenRegistered(#{} {})", position, info)
            }
            HubEvent::TokenUpdated { info } => write!(f, "TokenUpdated({})", info),
            HubEvent::PeerSet { eid, peer } => write!(f, "PeerSet({} -> 0x{})", eid, hex::encode(peer)),
            HubEvent::RootUpdated {
                eid,
                root,
                index,
                changed,
            } => write!(f, "RootUpdated({} root={} index={} changed={})", eid, root, index, changed),
            HubEvent::Broadcast { root, agg_seq, targets } => {
                write!(f, "Broadcast(seq={} root={} targets={:?})", agg_seq, root, targets)
            }
            HubEvent::OwnershipTransferred { previous, owner } => write!(
                f,
                "OwnershipTransferred(0x{} -> 0x{})",
                hex::encode(previous),
                hex::encode(owner)
            ),
        }
    }
}
