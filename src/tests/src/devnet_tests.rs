//! Tests for the devnet node with its relayer running as a task.

use crate::harness::{batch_proof, transition_proof};
use serial_test::serial;
use std::time::Duration;
use teleport_core::types::{Address, Field, RecipientDescriptor};
use teleport_gateway::SourceLedger;
use teleport_node::config::{ChainConfig, NodeConfig};
use teleport_node::{keeper, relayer, Devnet};
use tokio::time::sleep;

const ALICE: Address = [0x01; 32];
const BOB: Address = [0x02; 32];

/// Polls `condition` until it holds, failing after two seconds.
async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Tests a full round trip: burn, prove, relay, broadcast and teleport.
#[tokio::test]
#[serial]
async fn test_devnet_round_trip() {
    let config = NodeConfig::default();
    let (devnet, rx) = Devnet::from_config(&config).unwrap();
    let relayer_task = tokio::spawn(relayer::run(devnet.clone(), rx));

    let (source, target) = (config.chains[0], config.chains[1]);
    let bob = RecipientDescriptor::new(target.chain_id, BOB, Field::from_u64(3));

    // Alice burns 40 on the source chain towards Bob
    {
        let mut gateway = devnet.gateway(source.eid).unwrap().lock().unwrap();
        gateway.ledger_mut().credit(&ALICE, 100).unwrap();
        gateway.ledger_mut().transfer(&ALICE, bob.commitment(), 40).unwrap();
    }

    // The keeper reserves the new hash chain; the hub broadcasts its registrations
    let report = keeper::tick(&devnet).unwrap();
    assert!(report.reserved.contains(&(source.eid, 1)));
    assert_eq!(report.broadcast, Some(1));

    // An external prover advances the source chain's root
    let transfer_root = Field::from_u64(0xfeed);
    {
        let mut gateway = devnet.gateway(source.eid).unwrap().lock().unwrap();
        let genesis = gateway.proved_transfer_root(0);
        let chain = gateway.ledger().hash_chain();
        gateway
            .prove_transfer_root(&transition_proof(0, genesis, 1, chain, transfer_root))
            .unwrap();
    }

    // Next round relays it
    let report = keeper::tick(&devnet).unwrap();
    assert_eq!(report.relayed, vec![source.eid]);
    wait_for(|| devnet.hub().lock().unwrap().transfer_root(source.eid) == Some(transfer_root)).await;

    // And the round after that broadcasts it
    let report = keeper::tick(&devnet).unwrap();
    assert_eq!(report.broadcast, Some(2));
    let aggregate = devnet.hub().lock().unwrap().aggregation_root().unwrap();
    wait_for(|| {
        devnet
            .gateways()
            .values()
            .all(|gateway| gateway.lock().unwrap().global_transfer_root(2) == aggregate)
    })
    .await;

    // Bob claims on the target chain
    {
        let mut gateway = devnet.gateway(target.eid).unwrap().lock().unwrap();
        let receipt = gateway
            .teleport(true, 2, &bob, &batch_proof(aggregate, bob.commitment(), 40))
            .unwrap();
        assert_eq!(receipt.amount, 40);
        assert_eq!(gateway.ledger().balance_of(&BOB), 40);
    }

    relayer_task.abort();
}

/// Tests that the keeper loop keeps the gateways in sync on its own.
#[tokio::test]
#[serial]
async fn test_keeper_loop_broadcasts() {
    let (devnet, rx) = Devnet::from_config(&NodeConfig::default()).unwrap();
    let relayer_task = tokio::spawn(relayer::run(devnet.clone(), rx));
    let keeper_task = tokio::spawn(keeper::run(devnet.clone(), Duration::from_millis(20)));

    wait_for(|| {
        devnet
            .gateways()
            .values()
            .all(|gateway| gateway.lock().unwrap().latest_agg_seq() >= 1)
    })
    .await;
    assert!(devnet.hub().lock().unwrap().is_up_to_date());

    keeper_task.abort();
    relayer_task.abort();
}

/// Tests that a devnet built from a config file registers every listed chain in order.
#[tokio::test]
#[serial]
async fn test_devnet_from_config_file() {
    let mut config = NodeConfig::default();
    config.chains.push(ChainConfig {
        eid: 30_103,
        chain_id: 137,
    });
    let file = tempfile::NamedTempFile::new().unwrap();
    config.to_file(file.path()).unwrap();

    let loaded = NodeConfig::from_file(file.path()).unwrap();
    loaded.validate().unwrap();
    let (devnet, mut rx) = Devnet::from_config(&loaded).unwrap();

    assert_eq!(devnet.gateways().len(), 3);
    assert_eq!(devnet.hub().lock().unwrap().registered_eids(), vec![30_101, 30_102, 30_103]);

    // One round reaches all three chains
    assert_eq!(keeper::tick(&devnet).unwrap().broadcast, Some(1));
    assert_eq!(relayer::flush(&devnet, &mut rx), (3, 0));
    let gateway = devnet.gateway(30_103).unwrap().lock().unwrap();
    assert_eq!(gateway.latest_agg_seq(), 1);
    assert_eq!(gateway.config().chain_id, 137);
}
