//! The teleport gateway state machine.

use crate::errors::GatewayError;
use crate::events::GatewayEvent;
use crate::ledger::SourceLedger;
use crate::verifier::{VerifierKind, VerifierSet};
use std::collections::HashMap;
use teleport_core::merkle::{empty_root, TRANSFER_TREE_HEIGHT};
use teleport_core::proofs::{BatchTeleportProof, RootTransitionProof, SingleTeleportProof, TeleportClaim};
use teleport_core::types::{Address, Balance, ChainId, EndpointId, Field, RecipientDescriptor, ZERO_ADDRESS};
use teleport_network::transport::Transport;
use teleport_network::types::{GlobalRootMsg, MessagingFee, MessagingReceipt, Origin, RootUpdateMsg};
use tracing::{debug, error, info, warn};

/// Static parameters of a gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Chain id recipients must target
    pub chain_id: ChainId,
    /// Endpoint id of the aggregation root ledger
    pub hub_eid: EndpointId,
    /// Application address of the aggregation root ledger
    pub hub_peer: Address,
    /// Administrator
    pub owner: Address,
    /// Proved root at index 0
    pub genesis_root: Field,
}

impl GatewayConfig {
    /// Creates a config whose genesis root is the empty transfer tree root.
    pub fn new(chain_id: ChainId, hub_eid: EndpointId, hub_peer: Address, owner: Address) -> Self {
        Self {
            chain_id,
            hub_eid,
            hub_peer,
            owner,
            genesis_root: empty_root(TRANSFER_TREE_HEIGHT),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayState {
    Active,
    Paused,
}

/// Result of an accepted root transition proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProveOutcome {
    /// The root is stored at `index`.
    Stored { index: u64, root: Field },
    /// A different root was already stored at `index`. Nothing was written and
    /// the gateway is now paused.
    ConflictDetected { index: u64, stored: Field, proposed: Field },
}

/// Result of a successful teleport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportReceipt {
    /// Recipient commitment the value was claimed under
    pub recipient: Field,
    /// Address that received the mint
    pub to: Address,
    /// Minted in this call
    pub amount: Balance,
    /// Minted to this commitment so far
    pub total: Balance,
}

/// Gates transfer-root advancement and minting on one chain behind proofs.
pub struct TeleportGateway<L: SourceLedger, T: Transport> {
    config: GatewayConfig,
    state: GatewayState,
    verifiers: VerifierSet,
    ledger: L,
    transport: T,
    /// Transfer index -> reserved hash chain
    reserved_hash_chains: HashMap<u64, Field>,
    latest_reserved_index: u64,
    /// Transfer index -> proved root, seeded with the genesis root at 0
    proved_transfer_roots: HashMap<u64, Field>,
    latest_proved_index: u64,
    latest_relayed_index: u64,
    /// Aggregation sequence -> aggregation root, first write wins
    global_transfer_roots: HashMap<u64, Field>,
    latest_agg_seq: u64,
    /// Recipient commitment -> cumulative minted value
    total_teleported: HashMap<Field, Balance>,
    events: Vec<GatewayEvent>,
}

impl<L: SourceLedger, T: Transport> TeleportGateway<L, T> {
    /// Creates an active gateway.
    pub fn new(config: GatewayConfig, verifiers: VerifierSet, ledger: L, transport: T) -> Result<Self, GatewayError> {
        if config.owner == ZERO_ADDRESS {
            return Err(GatewayError::ZeroAddress("owner"));
        }
        if config.hub_peer == ZERO_ADDRESS {
            return Err(GatewayError::ZeroAddress("hub peer"));
        }
        verifiers.validate()?;

        let mut proved_transfer_roots = HashMap::new();
        proved_transfer_roots.insert(0, config.genesis_root);

        Ok(Self {
            config,
            state: GatewayState::Active,
            verifiers,
            ledger,
            transport,
            reserved_hash_chains: HashMap::new(),
            latest_reserved_index: 0,
            proved_transfer_roots,
            latest_proved_index: 0,
            latest_relayed_index: 0,
            global_transfer_roots: HashMap::new(),
            latest_agg_seq: 0,
            total_teleported: HashMap::new(),
            events: Vec::new(),
        })
    }

    fn only_owner(&self, caller: &Address) -> Result<(), GatewayError> {
        if *caller != self.config.owner {
            return Err(GatewayError::Unauthorized(*caller));
        }
        Ok(())
    }

    fn when_active(&self) -> Result<(), GatewayError> {
        match self.state {
            GatewayState::Active => Ok(()),
            GatewayState::Paused => Err(GatewayError::Paused),
        }
    }

    /// Snapshots the ledger's current transfer index and hash chain.
    ///
    /// Reserving the same index again overwrites the earlier snapshot.
    pub fn reserve_hash_chain(&mut self) -> (u64, Field) {
        let index = self.ledger.transfer_index();
        let hash_chain = self.ledger.hash_chain();

        self.reserved_hash_chains.insert(index, hash_chain);
        self.latest_reserved_index = self.latest_reserved_index.max(index);

        debug!("Reserved hash chain {} at index {}", hash_chain, index);
        self.events.push(GatewayEvent::HashChainReserved { index, hash_chain });
        (index, hash_chain)
    }

    /// Advances the proved transfer root.
    ///
    /// The proof must start from a stored root and end at a reserved hash
    /// chain. If another root is already stored at the new index the gateway
    /// pauses and the call still succeeds with
    /// [`ProveOutcome::ConflictDetected`].
    pub fn prove_transfer_root(&mut self, proof: &RootTransitionProof) -> Result<ProveOutcome, GatewayError> {
        self.when_active()?;

        if !self.verifiers.verify(VerifierKind::TransferRoot, &proof.to_elements()) {
            return Err(GatewayError::InvalidProof);
        }

        let old_root = self.proved_transfer_root(proof.old_index);
        if old_root.is_zero() {
            return Err(GatewayError::OldRootZero(proof.old_index));
        }
        if old_root != proof.old_root {
            return Err(GatewayError::OldRootMismatch {
                expected: old_root,
                supplied: proof.old_root,
            });
        }

        let reserved = self.reserved_hash_chain(proof.new_index);
        if reserved.is_zero() {
            return Err(GatewayError::ReserveHashChainNotFound(proof.new_index));
        }
        if reserved != proof.new_hash_chain {
            return Err(GatewayError::NewHashChainMismatch {
                expected: reserved,
                supplied: proof.new_hash_chain,
            });
        }

        let index = proof.new_index;
        let stored = self.proved_transfer_root(index);
        if !stored.is_zero() && stored != proof.new_root {
            self.state = GatewayState::Paused;
            error!(
                "Transfer root conflict at index {}: stored {}, proposed {}. Gateway paused",
                index, stored, proof.new_root
            );
            self.events.push(GatewayEvent::TransferRootConflict {
                index,
                stored,
                proposed: proof.new_root,
            });
            return Ok(ProveOutcome::ConflictDetected {
                index,
                stored,
                proposed: proof.new_root,
            });
        }

        self.proved_transfer_roots.insert(index, proof.new_root);
        if index > self.latest_proved_index {
            self.latest_proved_index = index;
        }

        info!("Proved transfer root {} at index {}", proof.new_root, index);
        self.events.push(GatewayEvent::TransferRootProved {
            index,
            root: proof.new_root,
        });
        Ok(ProveOutcome::Stored {
            index,
            root: proof.new_root,
        })
    }

    /// Mints against a batch (folding) teleport proof.
    pub fn teleport(
        &mut self,
        is_global: bool,
        root_hint: u64,
        recipient: &RecipientDescriptor,
        proof: &BatchTeleportProof,
    ) -> Result<TeleportReceipt, GatewayError> {
        self.when_active()?;

        // A folded proof must cover the history from its very first leaf
        if !proof.initial.leaf_index.is_zero() {
            return Err(GatewayError::InvalidInitialLeafIndex(proof.initial.leaf_index));
        }
        if !proof.initial.cumulative_value.is_zero() {
            return Err(GatewayError::InvalidInitialCumulativeValue(proof.initial.cumulative_value));
        }
        if proof.final_state.transfer_root != proof.initial.transfer_root {
            return Err(GatewayError::FinalRootMismatch {
                expected: proof.initial.transfer_root,
                supplied: proof.final_state.transfer_root,
            });
        }
        if proof.final_state.recipient != proof.initial.recipient {
            return Err(GatewayError::FinalRecipientMismatch {
                expected: proof.initial.recipient,
                supplied: proof.final_state.recipient,
            });
        }

        if !self.verifiers.verify(VerifierKind::batch(is_global), &proof.to_elements()) {
            return Err(GatewayError::InvalidProof);
        }

        let claim = proof.claim()?;
        self.finalize_teleport(is_global, root_hint, recipient, claim)
    }

    /// Mints against a single (pairing) teleport proof.
    pub fn single_teleport(
        &mut self,
        is_global: bool,
        root_hint: u64,
        recipient: &RecipientDescriptor,
        proof: &SingleTeleportProof,
    ) -> Result<TeleportReceipt, GatewayError> {
        self.when_active()?;

        if !self.verifiers.verify(VerifierKind::single(is_global), &proof.to_elements()) {
            return Err(GatewayError::InvalidProof);
        }

        let claim = proof.claim()?;
        self.finalize_teleport(is_global, root_hint, recipient, claim)
    }

    fn finalize_teleport(
        &mut self,
        is_global: bool,
        root_hint: u64,
        recipient: &RecipientDescriptor,
        claim: TeleportClaim,
    ) -> Result<TeleportReceipt, GatewayError> {
        let expected = if is_global {
            self.global_transfer_root(root_hint)
        } else {
            self.proved_transfer_root(root_hint)
        };
        if expected.is_zero() {
            return Err(GatewayError::ExpectedRootZero {
                is_global,
                index: root_hint,
            });
        }
        if expected != claim.transfer_root {
            return Err(GatewayError::TransferRootMismatch {
                expected,
                supplied: claim.transfer_root,
            });
        }

        let commitment = recipient.commitment();
        if commitment != claim.recipient {
            return Err(GatewayError::RecipientMismatch {
                expected: claim.recipient,
                supplied: commitment,
            });
        }
        if recipient.chain_id != self.config.chain_id {
            return Err(GatewayError::InvalidRecipientChainId {
                expected: self.config.chain_id,
                supplied: recipient.chain_id,
            });
        }

        let teleported = self.total_teleported(&commitment);
        if claim.cumulative_value <= teleported {
            return Err(GatewayError::NothingToWithdraw {
                proven: claim.cumulative_value,
                teleported,
            });
        }
        let amount = claim.cumulative_value - teleported;

        let minter = self.transport.sender();
        self.ledger.mint(&minter, &recipient.recipient, amount)?;
        self.total_teleported.insert(commitment, claim.cumulative_value);

        info!(
            "Teleported {} to 0x{} (commitment {}, total {})",
            amount,
            hex::encode(recipient.recipient),
            commitment,
            claim.cumulative_value
        );
        self.events.push(GatewayEvent::Teleported {
            recipient: commitment,
            to: recipient.recipient,
            amount,
            total: claim.cumulative_value,
        });

        Ok(TeleportReceipt {
            recipient: commitment,
            to: recipient.recipient,
            amount,
            total: claim.cumulative_value,
        })
    }

    fn relay_payload(&self) -> Result<Vec<u8>, GatewayError> {
        let root = self.proved_transfer_root(self.latest_proved_index);
        if root.is_zero() {
            return Err(GatewayError::NoProvedRoot);
        }
        Ok(RootUpdateMsg {
            root,
            index: self.latest_proved_index,
        }
        .encode())
    }

    /// Quotes relaying the latest proved root to the hub.
    pub fn quote_relay_transfer_root(&self, options: &[u8]) -> Result<MessagingFee, GatewayError> {
        let payload = self.relay_payload()?;
        Ok(self.transport.quote(self.config.hub_eid, &payload, options)?)
    }

    /// Sends the latest proved root and its index to the hub.
    pub fn relay_transfer_root(
        &mut self,
        options: &[u8],
        value: u128,
        refund_to: &Address,
    ) -> Result<MessagingReceipt, GatewayError> {
        let payload = self.relay_payload()?;
        let fee = self.transport.quote(self.config.hub_eid, &payload, options)?;
        if value < fee.native_fee {
            return Err(GatewayError::InsufficientMsgValue {
                required: fee.native_fee,
                supplied: value,
            });
        }

        let receipt = self
            .transport
            .send(self.config.hub_eid, &payload, options, fee, refund_to)?;

        let index = self.latest_proved_index;
        let root = self.proved_transfer_root(index);
        self.latest_relayed_index = index;

        info!("Relayed transfer root {} at index {} (guid {})", root, index, receipt.guid);
        self.events.push(GatewayEvent::TransferRootRelayed {
            index,
            root,
            guid: receipt.guid,
        });
        Ok(receipt)
    }

    /// `true` when the latest proved root has been relayed.
    pub fn is_up_to_date(&self) -> bool {
        self.latest_proved_index == self.latest_relayed_index
    }

    /// Accepts an aggregation root broadcast by the hub. Returns whether it was stored.
    ///
    /// The first root received for a sequence number wins; later ones are dropped.
    pub fn receive_global_root(&mut self, origin: &Origin, payload: &[u8]) -> Result<bool, GatewayError> {
        if origin.src_eid != self.config.hub_eid || origin.sender != self.config.hub_peer {
            warn!(
                "Rejected global root from 0x{} on endpoint {}",
                hex::encode(origin.sender),
                origin.src_eid
            );
            return Err(GatewayError::UntrustedSource {
                eid: origin.src_eid,
                sender: origin.sender,
            });
        }

        let msg = GlobalRootMsg::decode(payload)?;

        let stored = self.global_transfer_root(msg.agg_seq).is_zero();
        if stored {
            self.global_transfer_roots.insert(msg.agg_seq, msg.root);
        }
        if msg.agg_seq > self.latest_agg_seq {
            self.latest_agg_seq = msg.agg_seq;
        }

        if stored {
            info!("Stored global root {} for sequence {}", msg.root, msg.agg_seq);
        } else {
            debug!("Dropped global root {} for known sequence {}", msg.root, msg.agg_seq);
        }
        self.events.push(GatewayEvent::GlobalRootReceived {
            agg_seq: msg.agg_seq,
            root: msg.root,
            stored,
        });
        Ok(stored)
    }

    pub fn activate_emergency(&mut self, caller: &Address) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        self.state = GatewayState::Paused;
        warn!("Emergency activated on chain {}", self.config.chain_id);
        self.events.push(GatewayEvent::EmergencyActivated);
        Ok(())
    }

    pub fn deactivate_emergency(&mut self, caller: &Address) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        self.state = GatewayState::Active;
        info!("Emergency deactivated on chain {}", self.config.chain_id);
        self.events.push(GatewayEvent::EmergencyDeactivated);
        Ok(())
    }

    /// Replaces all five oracles at once.
    pub fn set_verifiers(&mut self, caller: &Address, verifiers: VerifierSet) -> Result<(), GatewayError> {
        self.only_owner(caller)?;
        verifiers.validate()?;

        self.verifiers = verifiers;
        info!("Verifiers rotated on chain {}", self.config.chain_id);
        self.events.push(GatewayEvent::VerifiersUpdated);
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> GatewayState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == GatewayState::Paused
    }

    /// The gateway's own application address.
    pub fn address(&self) -> Address {
        self.transport.sender()
    }

    pub fn eid(&self) -> EndpointId {
        self.transport.local_eid()
    }

    pub fn verifiers(&self) -> &VerifierSet {
        &self.verifiers
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Reserved hash chain at `index`, zero if none.
    pub fn reserved_hash_chain(&self, index: u64) -> Field {
        self.reserved_hash_chains.get(&index).copied().unwrap_or(Field::ZERO)
    }

    /// Proved root at `index`, zero if none.
    pub fn proved_transfer_root(&self, index: u64) -> Field {
        self.proved_transfer_roots.get(&index).copied().unwrap_or(Field::ZERO)
    }

    /// Aggregation root for `agg_seq`, zero if none.
    pub fn global_transfer_root(&self, agg_seq: u64) -> Field {
        self.global_transfer_roots.get(&agg_seq).copied().unwrap_or(Field::ZERO)
    }

    /// Value minted so far to `recipient`.
    pub fn total_teleported(&self, recipient: &Field) -> Balance {
        self.total_teleported.get(recipient).copied().unwrap_or(0)
    }

    pub fn latest_reserved_index(&self) -> u64 {
        self.latest_reserved_index
    }

    pub fn latest_proved_index(&self) -> u64 {
        self.latest_proved_index
    }

    pub fn latest_relayed_index(&self) -> u64 {
        self.latest_relayed_index
    }

    pub fn latest_agg_seq(&self) -> u64 {
        self.latest_agg_seq
    }

    /// Removes and returns the events recorded so far.
    pub fn take_events(&mut self) -> Vec<GatewayEvent> {
        std::mem::take(&mut self.events)
    }
}
