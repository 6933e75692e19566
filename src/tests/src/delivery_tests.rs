//! Tests for duplicate, reordered and forged message delivery.

use crate::harness::{gateway_address, transition_proof, DeliveryError, Harness, HUB, HUB_EID};
use teleport_core::types::{Address, Field};
use teleport_gateway::{GatewayError, GatewayState, ProveOutcome};
use teleport_hub::HubError;
use teleport_network::{GlobalRootMsg, Origin, Packet, RootUpdateMsg};

const ALICE: Address = [0x01; 32];

fn global_packet(dst_eid: u32, root: Field, agg_seq: u64) -> Packet {
    Packet {
        origin: Origin {
            src_eid: HUB_EID,
            sender: HUB,
            nonce: agg_seq,
        },
        dst_eid,
        guid: Field::from_u64(agg_seq),
        payload: GlobalRootMsg { root, agg_seq }.encode(),
        options: Vec::new(),
    }
}

/// Tests that replaying root updates is idempotent and the last write wins.
#[test]
fn test_root_updates_last_write_wins() {
    let mut harness = Harness::new(&[(1, 10)]);
    harness.fund(1, &ALICE, 10);

    let first = Field::from_u64(0x100);
    harness.advance(1, &ALICE, &[(Field::ZERO, 1)], first);
    harness.relay(1);
    let old = harness.take_packets();

    let second = Field::from_u64(0x200);
    harness.advance(1, &ALICE, &[(Field::ZERO, 1)], second);
    harness.relay(1);
    let new = harness.take_packets();

    // Newest first, then a duplicate of the newest
    harness.deliver(&new[0]).unwrap();
    harness.deliver(&new[0]).unwrap();
    assert_eq!(harness.hub.transfer_root(1), Some(second));
    assert_eq!(harness.hub.transfer_tree_index(1), Some(2));

    // A delayed older update overwrites it: the hub keeps whatever arrived last
    harness.deliver(&old[0]).unwrap();
    assert_eq!(harness.hub.transfer_root(1), Some(first));
    assert_eq!(harness.hub.transfer_tree_index(1), Some(1));

    // Relaying again repairs the slot
    harness.relay(1);
    harness.deliver_all();
    assert_eq!(harness.hub.transfer_root(1), Some(second));
}

/// Tests that the first root per sequence wins regardless of arrival order.
#[test]
fn test_global_roots_first_write_wins() {
    let mut harness = Harness::new(&[(1, 10)]);
    let a = Field::from_u64(0xa);
    let b = Field::from_u64(0xb);

    harness.deliver(&global_packet(1, b, 2)).unwrap();
    harness.deliver(&global_packet(1, a, 1)).unwrap();
    harness.deliver(&global_packet(1, a, 2)).unwrap();
    harness.deliver(&global_packet(1, b, 1)).unwrap();

    let gateway = harness.gateway(1);
    assert_eq!(gateway.global_transfer_root(1), a);
    assert_eq!(gateway.global_transfer_root(2), b);
    assert_eq!(gateway.latest_agg_seq(), 2);
}

/// Tests that forged packets are refused and change nothing.
#[test]
fn test_forged_packets_rejected() {
    let mut harness = Harness::new(&[(1, 10), (2, 20)]);

    // Chain 2's gateway pretending to report for chain 1
    let forged_update = Packet {
        origin: Origin {
            src_eid: 1,
            sender: gateway_address(2),
            nonce: 1,
        },
        dst_eid: HUB_EID,
        guid: Field::ZERO,
        payload: RootUpdateMsg {
            root: Field::from_u64(1),
            index: 1,
        }
        .encode(),
        options: Vec::new(),
    };
    assert_eq!(
        harness.deliver(&forged_update),
        Err(DeliveryError::Hub(HubError::UntrustedSender {
            eid: 1,
            sender: gateway_address(2)
        }))
    );
    assert_eq!(harness.hub.transfer_root(1), Some(Field::ZERO));

    // A chain pretending to be the hub
    let mut forged_global = global_packet(1, Field::from_u64(1), 1);
    forged_global.origin.src_eid = 2;
    assert_eq!(
        harness.deliver(&forged_global),
        Err(DeliveryError::Gateway(GatewayError::UntrustedSource { eid: 2, sender: HUB }))
    );
    assert_eq!(harness.gateway(1).latest_agg_seq(), 0);

    assert_eq!(
        harness.deliver(&global_packet(7, Field::from_u64(1), 1)),
        Err(DeliveryError::UnknownEndpoint(7))
    );
}

/// Tests that a second, different root for an index pauses the gateway for good.
#[test]
fn test_conflicting_proofs_pause_gateway() {
    let mut harness = Harness::new(&[(1, 10)]);
    harness.fund(1, &ALICE, 100);

    let root_x = Field::from_u64(0x7);
    let root_y = Field::from_u64(0x8);
    let index = harness.advance(1, &ALICE, &[(Field::ZERO, 1); 7], root_x);
    assert_eq!(index, 7);

    let gateway = harness.gateway(1);
    let genesis = gateway.proved_transfer_root(0);
    let chain = gateway.reserved_hash_chain(7);

    // The conflicting proof succeeds but pauses
    assert_eq!(
        gateway.prove_transfer_root(&transition_proof(0, genesis, 7, chain, root_y)),
        Ok(ProveOutcome::ConflictDetected {
            index: 7,
            stored: root_x,
            proposed: root_y
        })
    );
    assert_eq!(gateway.state(), GatewayState::Paused);
    assert_eq!(gateway.proved_transfer_root(7), root_x);

    // Reserving and relaying still work, proofs do not
    gateway.reserve_hash_chain();
    assert_eq!(
        gateway.prove_transfer_root(&transition_proof(0, genesis, 7, chain, root_x)),
        Err(GatewayError::Paused)
    );
    harness.relay(1);
    harness.deliver_all();
    assert_eq!(harness.hub.transfer_root(1), Some(root_x));
}
