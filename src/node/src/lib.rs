//! Devnet node for the cross-chain teleport.
//!
//! Runs an aggregation root ledger and one gateway per configured chain in a
//! single process. Packets travel over a tokio channel to the relayer, and a
//! keeper drives the periodic reserve, relay and broadcast calls.

pub mod config;
pub mod errors;
pub mod keeper;
pub mod metrics;
pub mod relayer;

use config::{KeeperConfig, NodeConfig};
use errors::NodeError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use teleport_core::types::{Address, EndpointId, TokenInfo};
use teleport_gateway::{GatewayConfig, MemoryLedger, TeleportGateway, VerifierSet};
use teleport_hub::AggregationRootLedger;
use teleport_network::channel::packet_channel;
use teleport_network::{ChannelTransport, Packet};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

/// The hub behind its lock.
pub type HubHandle = Arc<Mutex<AggregationRootLedger<ChannelTransport>>>;

/// A gateway behind its lock.
pub type GatewayHandle = Arc<Mutex<TeleportGateway<MemoryLedger, ChannelTransport>>>;

fn tagged_address(tag: u8, eid: EndpointId) -> Address {
    let mut address = [0u8; 32];
    address[0] = tag;
    address[28..].copy_from_slice(&eid.to_be_bytes());
    address
}

/// Application address of the hub on endpoint `eid`.
pub fn hub_address(eid: EndpointId) -> Address {
    tagged_address(b'H', eid)
}

/// Application address of the gateway on endpoint `eid`.
pub fn gateway_address(eid: EndpointId) -> Address {
    tagged_address(b'G', eid)
}

/// Address of the token ledger on endpoint `eid`.
pub fn token_address(eid: EndpointId) -> Address {
    tagged_address(b'T', eid)
}

/// Locks a state machine for exactly one call.
pub fn lock<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>, NodeError> {
    mutex.lock().map_err(|_| NodeError::LockPoisoned(what))
}

/// Every state machine of a devnet.
#[derive(Clone)]
pub struct Devnet {
    hub_eid: EndpointId,
    owner: Address,
    keeper: KeeperConfig,
    hub: HubHandle,
    gateways: BTreeMap<EndpointId, GatewayHandle>,
}

impl Devnet {
    /// Builds the hub and one gateway per chain, registers every chain on the
    /// hub and trusts each gateway as the peer of its endpoint.
    ///
    /// Returns the receiving end of the packet channel every transport sends into.
    pub fn from_config(config: &NodeConfig) -> Result<(Self, UnboundedReceiver<Packet>), NodeError> {
        config
            .validate()
            .map_err(|e| NodeError::ConfigError(e.to_string()))?;

        let (tx, rx) = packet_channel();
        let owner = config.hub.owner;
        let hub_peer = hub_address(config.hub.eid);

        let transport = ChannelTransport::new(config.hub.eid, hub_peer, config.fees, tx.clone());
        let mut hub = AggregationRootLedger::new(owner, transport)?;

        let mut gateways = BTreeMap::new();
        for chain in &config.chains {
            let address = gateway_address(chain.eid);
            let transport = ChannelTransport::new(chain.eid, address, config.fees, tx.clone());
            let gateway = TeleportGateway::new(
                GatewayConfig::new(chain.chain_id, config.hub.eid, hub_peer, owner),
                VerifierSet::sealed(chain.eid),
                MemoryLedger::new(address),
                transport,
            )?;

            hub.register_token(
                &owner,
                TokenInfo {
                    chain_id: chain.chain_id,
                    eid: chain.eid,
                    verifier: address,
                    token: token_address(chain.eid),
                },
            )?;
            hub.set_peer(&owner, chain.eid, address)?;

            gateways.insert(chain.eid, Arc::new(Mutex::new(gateway)));
        }

        info!(
            "Devnet ready: hub on endpoint {} with {} chains",
            config.hub.eid,
            gateways.len()
        );

        let devnet = Self {
            hub_eid: config.hub.eid,
            owner,
            keeper: config.keeper,
            hub: Arc::new(Mutex::new(hub)),
            gateways,
        };
        Ok((devnet, rx))
    }

    pub fn hub_eid(&self) -> EndpointId {
        self.hub_eid
    }

    /// Administrator of every state machine, and payer of keeper fees.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn keeper(&self) -> &KeeperConfig {
        &self.keeper
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn gateways(&self) -> &BTreeMap<EndpointId, GatewayHandle> {
        &self.gateways
    }

    pub fn gateway(&self, eid: EndpointId) -> Result<&GatewayHandle, NodeError> {
        self.gateways.get(&eid).ok_or(NodeError::UnknownEndpoint(eid))
    }
}
