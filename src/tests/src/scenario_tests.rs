//! End-to-end flows across the hub and several gateways.

use crate::harness::{batch_proof, single_proof, Harness, HUB_EID, OWNER};
use teleport_core::merkle::aggregation_root;
use teleport_core::types::{Address, Field, RecipientDescriptor};
use teleport_gateway::GatewayError;
use teleport_network::RootUpdateMsg;

const ALICE: Address = [0x01; 32];
const BOB: Address = [0x02; 32];

/// Two chains report their roots and both receive the aggregation of the two.
#[test]
fn test_two_chain_aggregation() {
    let mut harness = Harness::new(&[(1, 10), (2, 20)]);
    harness.fund(1, &ALICE, 1_000);
    harness.fund(2, &ALICE, 1_000);

    // Chain 1 proves R1 at index 3, chain 2 proves R2 at index 5
    let r1 = Field::from_u64(0x1111);
    let r2 = Field::from_u64(0x2222);
    let one_each = (Field::from_u64(9), 1);
    assert_eq!(harness.advance(1, &ALICE, &[one_each; 3], r1), 3);
    assert_eq!(harness.advance(2, &ALICE, &[one_each; 5], r2), 5);

    // Both relay to the hub
    harness.relay(1);
    harness.relay(2);
    let packets = harness.take_packets();
    assert_eq!(packets.len(), 2);
    assert!(packets.iter().all(|p| p.dst_eid == HUB_EID));
    assert_eq!(
        RootUpdateMsg::decode(&packets[0].payload).unwrap(),
        RootUpdateMsg { root: r1, index: 3 }
    );
    for packet in &packets {
        harness.deliver(packet).unwrap();
    }
    assert_eq!(harness.hub.transfer_tree_index(1), Some(3));
    assert_eq!(harness.hub.transfer_tree_index(2), Some(5));
    assert!(harness.gateway(1).is_up_to_date());

    // The hub broadcasts to both
    let receipt = harness.broadcast(&[1, 2]);
    let aggregate = aggregation_root(&[r1, r2]).unwrap();
    assert_eq!(receipt.root, aggregate);
    assert_eq!(receipt.agg_seq, 1);
    assert!(harness.hub.is_up_to_date());
    assert_eq!(harness.deliver_all(), 2);

    for eid in [1, 2] {
        assert_eq!(harness.gateway(eid).global_transfer_root(1), aggregate);
        assert_eq!(harness.gateway(eid).latest_agg_seq(), 1);
    }
}

/// Broadcasting to a strict subset still marks the hub up to date even though
/// the left-out chain never learns the new root.
#[test]
fn test_subset_broadcast_leaves_chain_behind() {
    let mut harness = Harness::new(&[(1, 10), (2, 20)]);
    harness.fund(1, &ALICE, 10);
    harness.advance(1, &ALICE, &[(Field::from_u64(9), 1)], Field::from_u64(0x1111));
    harness.relay(1);
    harness.deliver_all();

    harness.broadcast(&[1]);
    assert!(harness.hub.is_up_to_date());
    assert_eq!(harness.deliver_all(), 1);

    assert_eq!(harness.gateway(1).latest_agg_seq(), 1);
    assert_eq!(harness.gateway(2).latest_agg_seq(), 0);
    assert_eq!(harness.gateway(2).global_transfer_root(1), Field::ZERO);

    // A later full broadcast carries a new sequence to everybody
    let receipt = harness.broadcast(&[1, 2]);
    assert_eq!(receipt.agg_seq, 2);
    harness.deliver_all();
    assert_eq!(harness.gateway(2).global_transfer_root(2), receipt.root);
}

/// Value burned on one chain is teleported on another against the global root.
#[test]
fn test_teleport_across_chains() {
    let mut harness = Harness::new(&[(1, 10), (2, 20)]);
    harness.fund(1, &ALICE, 500);

    // Alice burns 120 on chain 1 towards Bob on chain 2
    let bob = RecipientDescriptor::new(20, BOB, Field::from_u64(0x5eed));
    let commitment = bob.commitment();
    let transfer_root = Field::from_u64(0xabcd);
    harness.advance(1, &ALICE, &[(commitment, 120)], transfer_root);
    assert_eq!(harness.gateway(1).ledger().balance_of(&ALICE), 380);

    harness.relay(1);
    harness.deliver_all();
    let receipt = harness.broadcast(&[1, 2]);
    harness.deliver_all();

    // Bob claims on chain 2 against the aggregation root
    let gateway = harness.gateway(2);
    let proof = batch_proof(receipt.root, commitment, 120);
    let minted = gateway.teleport(true, receipt.agg_seq, &bob, &proof).unwrap();
    assert_eq!(minted.amount, 120);
    assert_eq!(gateway.ledger().balance_of(&BOB), 120);

    // The same claim cannot be made twice, by either proof shape
    assert_eq!(
        gateway.teleport(true, receipt.agg_seq, &bob, &proof),
        Err(GatewayError::NothingToWithdraw {
            proven: 120,
            teleported: 120
        })
    );
    assert!(matches!(
        gateway.single_teleport(true, receipt.agg_seq, &bob, &single_proof(receipt.root, commitment, 120)),
        Err(GatewayError::NothingToWithdraw { .. })
    ));

    // Chain 1 refuses: the descriptor names chain 2
    assert_eq!(
        harness.gateway(1).teleport(true, receipt.agg_seq, &bob, &proof),
        Err(GatewayError::InvalidRecipientChainId {
            expected: 10,
            supplied: 20
        })
    );
}

/// Minted totals never exceed the largest proven cumulative value.
#[test]
fn test_cumulative_claims() {
    let mut harness = Harness::new(&[(1, 10)]);
    harness.fund(1, &ALICE, 1_000);
    let bob = RecipientDescriptor::new(10, BOB, Field::from_u64(7));
    let commitment = bob.commitment();
    let root = Field::from_u64(0x77);
    let index = harness.advance(1, &ALICE, &[(commitment, 300)], root);

    let gateway = harness.gateway(1);
    let mut minted = 0;
    for proven in [100u128, 50, 100, 250, 200, 300] {
        match gateway.single_teleport(false, index, &bob, &single_proof(root, commitment, proven)) {
            Ok(receipt) => minted += receipt.amount,
            Err(GatewayError::NothingToWithdraw { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
        assert!(gateway.total_teleported(&commitment) <= 300);
    }

    assert_eq!(minted, 300);
    assert_eq!(gateway.ledger().balance_of(&BOB), 300);
}

/// A gateway paused by its owner rejects proofs but keeps taking global roots.
#[test]
fn test_emergency_pause() {
    let mut harness = Harness::new(&[(1, 10)]);
    harness.gateway(1).activate_emergency(&OWNER).unwrap();

    let receipt = harness.broadcast(&[1]);
    harness.deliver_all();
    assert_eq!(harness.gateway(1).global_transfer_root(1), receipt.root);

    let bob = RecipientDescriptor::new(10, BOB, Field::ZERO);
    let proof = batch_proof(receipt.root, bob.commitment(), 1);
    assert_eq!(harness.gateway(1).teleport(true, 1, &bob, &proof), Err(GatewayError::Paused));

    harness.gateway(1).deactivate_emergency(&OWNER).unwrap();
    assert_eq!(harness.gateway(1).teleport(true, 1, &bob, &proof).map(|r| r.amount), Ok(1));
}
