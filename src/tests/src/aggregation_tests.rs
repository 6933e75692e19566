//! Tests for the aggregation root as the hub computes it.

use crate::harness::{gateway_address, Harness, HUB_EID};
use rand::Rng;
use teleport_core::hash::hash_pair;
use teleport_core::merkle::{aggregation_root, AGGREGATION_TREE_HEIGHT, MAX_LEAVES};
use teleport_core::types::{EndpointId, Field};
use teleport_network::{Origin, RootUpdateMsg};

fn random_field() -> Field {
    let mut bytes: [u8; 32] = rand::thread_rng().gen();
    bytes[0] &= 0x1f;
    Field::from_bytes(bytes)
}

/// Hashes a full tree of `MAX_LEAVES` leaves, padding with zero leaves.
fn naive_root(leaves: &[Field]) -> Field {
    let mut layer: Vec<Field> = leaves.to_vec();
    layer.resize(MAX_LEAVES, Field::ZERO);
    for _ in 0..AGGREGATION_TREE_HEIGHT {
        layer = layer.chunks(2).map(|pair| hash_pair(&pair[0], &pair[1])).collect();
    }
    layer[0]
}

fn report(harness: &mut Harness, eid: EndpointId, root: Field) {
    let origin = Origin {
        src_eid: eid,
        sender: gateway_address(eid),
        nonce: 1,
    };
    let payload = RootUpdateMsg { root, index: 1 }.encode();
    harness.hub.receive_root_update(&origin, &payload).unwrap();
}

/// Tests that the hub's root matches naive zero-leaf hashing for every fill level.
#[test]
fn test_hub_root_matches_naive_hashing() {
    let chains: Vec<(EndpointId, u64)> = (1..=MAX_LEAVES as u32).map(|eid| (eid, eid as u64)).collect();

    for count in [0usize, 1, 2, 3, 5, 16, 17, MAX_LEAVES] {
        let mut harness = Harness::new(&chains[..count]);
        let mut roots = Vec::new();
        for &(eid, _) in &chains[..count] {
            let root = random_field();
            report(&mut harness, eid, root);
            roots.push(root);
        }

        assert_eq!(harness.hub.aggregation_root().unwrap(), naive_root(&roots), "{} chains", count);
    }
}

/// Tests that the root is a deterministic function of the slots and binds each one.
#[test]
fn test_root_binds_every_slot() {
    let chains = [(1, 1), (2, 2), (3, 3)];
    let mut first = Harness::new(&chains);
    let mut second = Harness::new(&chains);

    let roots = [random_field(), random_field(), random_field()];
    for (i, root) in roots.iter().enumerate() {
        report(&mut first, i as u32 + 1, *root);
        report(&mut second, i as u32 + 1, *root);
    }
    let root = first.hub.aggregation_root().unwrap();
    assert_eq!(root, second.hub.aggregation_root().unwrap());
    assert_eq!(root, aggregation_root(&roots).unwrap());

    // Changing any single slot changes the root
    for eid in 1..=3 {
        let mut changed = Harness::new(&chains);
        for (i, r) in roots.iter().enumerate() {
            let slot = i as u32 + 1;
            let value = if slot == eid { hash_pair(r, r) } else { *r };
            report(&mut changed, slot, value);
        }
        assert_ne!(changed.hub.aggregation_root().unwrap(), root);
    }
}

/// Tests that slot order follows registration order, not endpoint ids.
#[test]
fn test_slot_order_is_registration_order() {
    let mut forward = Harness::new(&[(1, 1), (2, 2)]);
    let mut reversed = Harness::new(&[(2, 2), (1, 1)]);

    let (a, b) = (random_field(), random_field());
    for harness in [&mut forward, &mut reversed] {
        report(harness, 1, a);
        report(harness, 2, b);
    }

    assert_eq!(forward.hub.aggregation_root().unwrap(), aggregation_root(&[a, b]).unwrap());
    assert_eq!(reversed.hub.aggregation_root().unwrap(), aggregation_root(&[b, a]).unwrap());
    assert_eq!(forward.hub.eid(), HUB_EID);
}
