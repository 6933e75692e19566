//! A synchronous multi-chain deployment over the in-memory message bus.
//!
//! Nothing is delivered until a test says so, which lets tests drop,
//! duplicate and reorder packets at will.

use std::collections::BTreeMap;
use teleport_core::proofs::{BatchTeleportProof, IvcState, RootTransitionProof, SingleTeleportProof};
use teleport_core::types::{Address, Balance, ChainId, EndpointId, Field, TokenInfo};
use teleport_gateway::{
    GatewayConfig, GatewayError, MemoryLedger, ProveOutcome, SealVerifier, TeleportGateway, VerifierSet,
};
use teleport_hub::{AggregationRootLedger, BroadcastReceipt, HubError};
use teleport_network::transport::FeeSchedule;
use teleport_network::{BusEndpoint, MessageBus, MessagingReceipt, Packet};

pub const HUB_EID: EndpointId = 100;
pub const HUB: Address = [0x48; 32];
pub const OWNER: Address = [0xaa; 32];

pub type Hub = AggregationRootLedger<BusEndpoint>;
pub type Gateway = TeleportGateway<MemoryLedger, BusEndpoint>;

/// Why a packet was not accepted.
#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryError {
    Hub(HubError),
    Gateway(GatewayError),
    UnknownEndpoint(EndpointId),
}

pub fn gateway_address(eid: EndpointId) -> Address {
    let mut address = [0x47; 32];
    address[28..].copy_from_slice(&eid.to_be_bytes());
    address
}

pub struct Harness {
    pub bus: MessageBus,
    pub hub: Hub,
    pub gateways: BTreeMap<EndpointId, Gateway>,
}

impl Harness {
    /// Deploys the hub and one gateway per `(eid, chain_id)`, registered in order.
    pub fn new(chains: &[(EndpointId, ChainId)]) -> Self {
        let bus = MessageBus::new();
        let mut hub = AggregationRootLedger::new(OWNER, bus.endpoint(HUB_EID, HUB, FeeSchedule::default())).unwrap();

        let mut gateways = BTreeMap::new();
        for &(eid, chain_id) in chains {
            let address = gateway_address(eid);
            let gateway = TeleportGateway::new(
                GatewayConfig::new(chain_id, HUB_EID, HUB, OWNER),
                VerifierSet::sealed(0x56),
                MemoryLedger::new(address),
                bus.endpoint(eid, address, FeeSchedule::default()),
            )
            .unwrap();

            hub.register_token(
                &OWNER,
                TokenInfo {
                    chain_id,
                    eid,
                    verifier: address,
                    token: [0x54; 32],
                },
            )
            .unwrap();
            hub.set_peer(&OWNER, eid, address).unwrap();
            gateways.insert(eid, gateway);
        }

        Self { bus, hub, gateways }
    }

    pub fn gateway(&mut self, eid: EndpointId) -> &mut Gateway {
        self.gateways.get_mut(&eid).unwrap()
    }

    /// Gives `account` a balance on chain `eid`.
    pub fn fund(&mut self, eid: EndpointId, account: &Address, amount: Balance) {
        self.gateway(eid).ledger_mut().credit(account, amount).unwrap();
    }

    /// Takes every packet sent so far.
    pub fn take_packets(&self) -> Vec<Packet> {
        self.bus.drain().unwrap()
    }

    /// Hands one packet to its destination.
    pub fn deliver(&mut self, packet: &Packet) -> Result<(), DeliveryError> {
        if packet.dst_eid == HUB_EID {
            return self
                .hub
                .receive_root_update(&packet.origin, &packet.payload)
                .map_err(DeliveryError::Hub);
        }

        let gateway = self
            .gateways
            .get_mut(&packet.dst_eid)
            .ok_or(DeliveryError::UnknownEndpoint(packet.dst_eid))?;
        gateway
            .receive_global_root(&packet.origin, &packet.payload)
            .map(|_| ())
            .map_err(DeliveryError::Gateway)
    }

    /// Delivers every queued packet in send order. Returns how many there were.
    pub fn deliver_all(&mut self) -> usize {
        let packets = self.take_packets();
        for packet in &packets {
            self.deliver(packet).unwrap();
        }
        packets.len()
    }

    /// Burns `transfers` from `from` on chain `eid`, reserves the resulting hash
    /// chain and proves `new_root` at that index. Returns the index.
    pub fn advance(&mut self, eid: EndpointId, from: &Address, transfers: &[(Field, Balance)], new_root: Field) -> u64 {
        let gateway = self.gateway(eid);
        for &(destination, amount) in transfers {
            gateway.ledger_mut().transfer(from, destination, amount).unwrap();
        }
        let (index, hash_chain) = gateway.reserve_hash_chain();

        let old_index = gateway.latest_proved_index();
        let old_root = gateway.proved_transfer_root(old_index);
        let outcome = gateway
            .prove_transfer_root(&transition_proof(old_index, old_root, index, hash_chain, new_root))
            .unwrap();
        assert_eq!(outcome, ProveOutcome::Stored { index, root: new_root });
        index
    }

    /// Relays the latest proved root of chain `eid`, paying exactly the quote.
    pub fn relay(&mut self, eid: EndpointId) -> MessagingReceipt {
        let gateway = self.gateway(eid);
        let fee = gateway.quote_relay_transfer_root(&[]).unwrap();
        gateway.relay_transfer_root(&[], fee.native_fee, &OWNER).unwrap()
    }

    /// Broadcasts to `targets`, paying exactly the quote.
    pub fn broadcast(&mut self, targets: &[EndpointId]) -> BroadcastReceipt {
        let fee = self.hub.quote_broadcast(targets, &[]).unwrap();
        self.hub.broadcast(targets, &[], fee.native_fee, &OWNER).unwrap()
    }
}

pub fn transition_proof(
    old_index: u64,
    old_root: Field,
    new_index: u64,
    new_hash_chain: Field,
    new_root: Field,
) -> RootTransitionProof {
    let mut proof = RootTransitionProof {
        header: Field::ZERO,
        old_index,
        old_hash_chain: Field::ZERO,
        old_root,
        new_index,
        new_hash_chain,
        new_root,
        oracle_data: [Field::ZERO; 25],
    };
    SealVerifier::seal_root_transition(&mut proof);
    proof
}

pub fn batch_proof(transfer_root: Field, recipient: Field, cumulative_value: Balance) -> BatchTeleportProof {
    let initial = IvcState {
        leaf_index: Field::ZERO,
        transfer_root,
        recipient,
        cumulative_value: Field::ZERO,
    };
    let mut proof = BatchTeleportProof {
        steps: Field::from_u64(1),
        initial,
        final_state: IvcState {
            leaf_index: Field::from_u64(1),
            cumulative_value: Field::from_u128(cumulative_value),
            ..initial
        },
        oracle_data: [Field::ZERO; 25],
    };
    SealVerifier::seal_batch_teleport(&mut proof);
    proof
}

pub fn single_proof(transfer_root: Field, recipient: Field, cumulative_value: Balance) -> SingleTeleportProof {
    let mut proof = SingleTeleportProof {
        a: [Field::ZERO, Field::from_u64(11)],
        b: [[Field::from_u64(12), Field::from_u64(13)], [Field::from_u64(14), Field::from_u64(15)]],
        c: [Field::from_u64(16), Field::from_u64(17)],
        transfer_root,
        recipient,
        cumulative_value: Field::from_u128(cumulative_value),
    };
    SealVerifier::seal_single_teleport(&mut proof);
    proof
}
