//! The aggregation root ledger state machine.

use crate::errors::HubError;
use crate::events::HubEvent;
use crate::registry::ChainRegistry;
use std::collections::HashMap;
use teleport_core::merkle::{aggregation_root, MAX_LEAVES};
use teleport_core::types::{Address, EndpointId, Field, TokenInfo, ZERO_ADDRESS};
use teleport_network::transport::Transport;
use teleport_network::types::{GlobalRootMsg, MessagingFee, MessagingReceipt, Origin, RootUpdateMsg};
use tracing::{debug, info, warn};

/// Outcome of a successful [`AggregationRootLedger::broadcast`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastReceipt {
    /// The aggregation root that was sent
    pub root: Field,
    /// Its sequence number
    pub agg_seq: u64,
    /// One receipt per target, in target order
    pub receipts: Vec<MessagingReceipt>,
    /// Value returned to the caller
    pub refund: u128,
}

/// Collects the latest transfer root of every registered chain and broadcasts
/// their aggregation.
///
/// Every operation validates fully before it writes, so a failed call leaves
/// the ledger unchanged. The one exception is a broadcast whose transport
/// fails after at least one target was sent to: its sequence number stays
/// consumed.
pub struct AggregationRootLedger<T: Transport> {
    /// Account allowed to administer the ledger
    owner: Address,
    /// Outbound messaging
    transport: T,
    /// Registered chains and their slots
    registry: ChainRegistry,
    /// Trusted sender per source endpoint
    peers: HashMap<EndpointId, Address>,
    /// Sequence number of the last broadcast
    agg_seq: u64,
    /// `false` whenever a slot changed since the last broadcast
    is_up_to_date: bool,
    /// Events not yet taken
    events: Vec<HubEvent>,
}

impl<T: Transport> AggregationRootLedger<T> {
    /// Creates an empty ledger administered by `owner`.
    pub fn new(owner: Address, transport: T) -> Result<Self, HubError> {
        if owner == ZERO_ADDRESS {
            return Err(HubError::ZeroAddress("owner"));
        }

        Ok(Self {
            owner,
            transport,
            registry: ChainRegistry::new(),
            peers: HashMap::new(),
            agg_seq: 0,
            is_up_to_date: false,
            events: Vec::new(),
        })
    }

    /// The endpoint id the ledger lives on.
    pub fn eid(&self) -> EndpointId {
        self.transport.local_eid()
    }

    /// The ledger's own application address.
    pub fn address(&self) -> Address {
        self.transport.sender()
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn only_owner(&self, caller: &Address) -> Result<(), HubError> {
        if *caller != self.owner {
            return Err(HubError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Registers a new chain. Returns its 1-based position.
    pub fn register_token(&mut self, caller: &Address, info: TokenInfo) -> Result<usize, HubError> {
        self.only_owner(caller)?;
        if info.verifier == ZERO_ADDRESS {
            return Err(HubError::ZeroAddress("verifier"));
        }
        if info.token == ZERO_ADDRESS {
            return Err(HubError::ZeroAddress("token"));
        }
        if info.chain_id == 0 {
            return Err(HubError::ZeroChainId);
        }
        if self.registry.contains(info.eid) {
            return Err(HubError::AlreadyRegistered(info.eid));
        }
        if self.registry.is_full() {
            return Err(HubError::CapacityExhausted(MAX_LEAVES));
        }

        let position = self.registry.push(info.clone());
        self.is_up_to_date = false;

        info!("Registered {} at position {}", info, position);
        self.events.push(HubEvent::TokenRegistered { position, info });
        Ok(position)
    }

    /// Replaces the registration of an already registered chain, keeping its slot.
    pub fn update_token(&mut self, caller: &Address, info: TokenInfo) -> Result<(), HubError> {
        self.only_owner(caller)?;
        if !self.registry.contains(info.eid) {
            return Err(HubError::NotRegistered(info.eid));
        }

        self.registry.replace(info.clone());
        info!("Updated registration {}", info);
        self.events.push(HubEvent::TokenUpdated { info });
        Ok(())
    }

    /// Sets the trusted sender for messages from `eid`. A zero peer clears it.
    pub fn set_peer(&mut self, caller: &Address, eid: EndpointId, peer: Address) -> Result<(), HubError> {
        self.only_owner(caller)?;

        if peer == ZERO_ADDRESS {
            self.peers.remove(&eid);
        } else {
            self.peers.insert(eid, peer);
        }

        debug!("Peer for endpoint {} set to 0x{}", eid, hex::encode(peer));
        self.events.push(HubEvent::PeerSet { eid, peer });
        Ok(())
    }

    /// Returns the configured peer for `eid`.
    pub fn peer(&self, eid: EndpointId) -> Option<Address> {
        self.peers.get(&eid).copied()
    }

    /// Hands ownership to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), HubError> {
        self.only_owner(caller)?;
        if new_owner == ZERO_ADDRESS {
            return Err(HubError::ZeroAddress("owner"));
        }

        let previous = std::mem::replace(&mut self.owner, new_owner);
        info!(
            "Ownership transferred from 0x{} to 0x{}",
            hex::encode(previous),
            hex::encode(new_owner)
        );
        self.events.push(HubEvent::OwnershipTransferred {
            previous,
            owner: new_owner,
        });
        Ok(())
    }

    /// Accepts a transfer root reported by a gateway.
    ///
    /// The freshness flag only drops when the stored root actually changes;
    /// replays of the current root leave it alone.
    pub fn receive_root_update(&mut self, origin: &Origin, payload: &[u8]) -> Result<(), HubError> {
        let eid = origin.src_eid;
        if !self.registry.contains(eid) {
            return Err(HubError::NotRegistered(eid));
        }

        let msg = RootUpdateMsg::decode(payload)?;

        // Without a configured peer only the owner may report
        let trusted = self.peers.get(&eid).copied().unwrap_or(self.owner);
        if origin.sender != trusted {
            warn!(
                "Rejected root update from 0x{} for endpoint {}",
                hex::encode(origin.sender),
                eid
            );
            return Err(HubError::UntrustedSender {
                eid,
                sender: origin.sender,
            });
        }

        let changed = self.registry.set_root(eid, msg.root, msg.index).unwrap_or(false);
        if changed {
            self.is_up_to_date = false;
        }

        info!(
            "Root update from endpoint {}: root={} index={} changed={}",
            eid, msg.root, msg.index, changed
        );
        self.events.push(HubEvent::RootUpdated {
            eid,
            root: msg.root,
            index: msg.index,
            changed,
        });
        Ok(())
    }

    /// The aggregation root over every registered slot.
    pub fn aggregation_root(&self) -> Result<Field, HubError> {
        Ok(aggregation_root(self.registry.transfer_roots())?)
    }

    fn next_payload(&self) -> Result<GlobalRootMsg, HubError> {
        Ok(GlobalRootMsg {
            root: self.aggregation_root()?,
            agg_seq: self.agg_seq + 1,
        })
    }

    /// Quotes each target individually.
    fn quote_each(&self, targets: &[EndpointId], options: &[u8], payload: &[u8]) -> Result<Vec<MessagingFee>, HubError> {
        targets
            .iter()
            .map(|&eid| {
                if !self.registry.contains(eid) {
                    return Err(HubError::NotRegistered(eid));
                }
                let fee = self.transport.quote(eid, payload, options)?;
                if fee.lz_token_fee != 0 {
                    return Err(HubError::UnsupportedFeeToken {
                        eid,
                        fee: fee.lz_token_fee,
                    });
                }
                Ok(fee)
            })
            .collect()
    }

    /// Quotes the total native fee of broadcasting to `targets`.
    pub fn quote_broadcast(&self, targets: &[EndpointId], options: &[u8]) -> Result<MessagingFee, HubError> {
        let payload = self.next_payload()?.encode();
        let fees = self.quote_each(targets, options, &payload)?;
        Ok(MessagingFee::native(total_native_fee(&fees)?))
    }

    /// Sends the current aggregation root to `targets`.
    ///
    /// The state is marked up to date even when `targets` is a strict subset of
    /// the registered chains; covering every chain is the caller's job.
    pub fn broadcast(
        &mut self,
        targets: &[EndpointId],
        options: &[u8],
        value: u128,
        refund_to: &Address,
    ) -> Result<BroadcastReceipt, HubError> {
        let msg = self.next_payload()?;
        let payload = msg.encode();

        let fees = self.quote_each(targets, options, &payload)?;
        let required = total_native_fee(&fees)?;
        if value < required {
            return Err(HubError::InsufficientValue {
                required,
                supplied: value,
            });
        }

        let mut receipts = Vec::with_capacity(targets.len());
        for (&eid, fee) in targets.iter().zip(fees) {
            let receipt = self.transport.send(eid, &payload, options, fee, refund_to).map_err(|e| {
                if !receipts.is_empty() {
                    warn!("Broadcast seq {} failed after {} sends: {}", msg.agg_seq, receipts.len(), e);
                }
                e
            })?;
            // Once anything went out the number belongs to this root
            self.agg_seq = msg.agg_seq;
            receipts.push(receipt);
        }
        self.agg_seq = msg.agg_seq;

        self.is_up_to_date = true;
        let refund = value - required;

        info!(
            "Broadcast aggregation root {} (seq {}) to {} of {} chains",
            msg.root,
            msg.agg_seq,
            targets.len(),
            self.registry.len()
        );
        self.events.push(HubEvent::Broadcast {
            root: msg.root,
            agg_seq: msg.agg_seq,
            targets: targets.to_vec(),
        });

        Ok(BroadcastReceipt {
            root: msg.root,
            agg_seq: msg.agg_seq,
            receipts,
            refund,
        })
    }

    /// Snapshot of every registration in registration order.
    pub fn token_infos(&self) -> Vec<TokenInfo> {
        self.registry.infos().to_vec()
    }

    /// Endpoint ids of every registered chain in registration order.
    pub fn registered_eids(&self) -> Vec<EndpointId> {
        self.registry.infos().iter().map(|info| info.eid).collect()
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn agg_seq(&self) -> u64 {
        self.agg_seq
    }

    pub fn is_up_to_date(&self) -> bool {
        self.is_up_to_date
    }

    /// Latest root reported by `eid`.
    pub fn transfer_root(&self, eid: EndpointId) -> Option<Field> {
        self.registry.slot(eid).map(|(root, _)| root)
    }

    /// Transfer index of the latest root reported by `eid`.
    pub fn transfer_tree_index(&self, eid: EndpointId) -> Option<u64> {
        self.registry.slot(eid).map(|(_, index)| index)
    }

    /// Removes and returns the events recorded so far.
    pub fn take_events(&mut self) -> Vec<HubEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Sums the native fees, failing instead of wrapping.
fn total_native_fee(fees: &[MessagingFee]) -> Result<u128, HubError> {
    fees.iter().try_fold(0u128, |acc, fee| {
        acc.checked_add(fee.native_fee).ok_or(HubError::FeeOverflow)
    })
}
