//! Configuration for the devnet node.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use teleport_core::merkle::MAX_LEAVES;
use teleport_core::types::{hex_address, Address, ChainId, EndpointId, ZERO_ADDRESS};
use teleport_network::transport::FeeSchedule;

/// Configuration for the devnet node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Aggregation root ledger
    pub hub: HubConfig,
    /// Participating chains, registered on the hub in this order
    pub chains: Vec<ChainConfig>,
    /// Message pricing shared by every endpoint
    pub fees: FeeSchedule,
    /// Keeper configuration
    pub keeper: KeeperConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Endpoint id of the home chain
    pub eid: EndpointId,
    /// Administrator of the hub and of every gateway
    #[serde(with = "hex_address")]
    pub owner: Address,
}

/// One participating chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Transport endpoint id
    pub eid: EndpointId,
    /// Chain id recipients use
    pub chain_id: ChainId,
}

/// Keeper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Seconds between keeper rounds
    pub interval_secs: u64,
    /// Value attached to each relay
    pub relay_value: u128,
    /// Value attached to each broadcast
    pub broadcast_value: u128,
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether to enable the metrics server
    pub enabled: bool,
    /// Listen address for the metrics server
    pub listen_addr: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            hub: HubConfig {
                eid: 30_100,
                owner: [0x0a; 32],
            },
            chains: vec![
                ChainConfig {
                    eid: 30_101,
                    chain_id: 1,
                },
                ChainConfig {
                    eid: 30_102,
                    chain_id: 10,
                },
            ],
            fees: FeeSchedule::default(),
            keeper: KeeperConfig {
                interval_secs: 5,
                relay_value: 10_000,
                broadcast_value: 100_000,
            },
            metrics: MetricsConfig {
                enabled: false,
                listen_addr: "127.0.0.1:9090".to_string(),
            },
        }
    }
}

impl NodeConfig {
    /// Loads configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Where the node looks for a config file when none is given.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("teleport");
        path.push("node.json");
        path
    }

    /// Checks the settings a devnet cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.hub.owner == ZERO_ADDRESS {
            bail!("hub owner must be non-zero");
        }
        if self.chains.len() > MAX_LEAVES {
            bail!("at most {} chains are supported, got {}", MAX_LEAVES, self.chains.len());
        }
        if self.keeper.interval_secs == 0 {
            bail!("keeper interval must be at least one second");
        }

        let mut seen = HashSet::new();
        seen.insert(self.hub.eid);
        for chain in &self.chains {
            if chain.chain_id == 0 {
                bail!("chain id of endpoint {} must be non-zero", chain.eid);
            }
            if !seen.insert(chain.eid) {
                bail!("endpoint id {} is used twice", chain.eid);
            }
        }
        Ok(())
    }
}
