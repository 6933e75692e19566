//! Devnet daemon for the cross-chain teleport.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use teleport_node::config::NodeConfig;
use teleport_node::{keeper, metrics, relayer, Devnet};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line arguments for the devnet daemon.
#[derive(Debug, StructOpt)]
#[structopt(name = "teleport-node", about = "Cross-chain teleport devnet node")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Seconds between keeper rounds
    #[structopt(short, long)]
    interval: Option<u64>,

    /// Enable metrics server
    #[structopt(long)]
    metrics: bool,

    /// Metrics server address
    #[structopt(long)]
    metrics_addr: Option<String>,

    /// Write the effective configuration to this path and exit
    #[structopt(long, parse(from_os_str))]
    dump_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let opt = Opt::from_args();

    // Load configuration
    let mut config = match &opt.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => {
            let path = NodeConfig::default_path();
            if path.exists() {
                info!("Using configuration from {}", path.display());
                NodeConfig::from_file(&path)?
            } else {
                NodeConfig::default()
            }
        }
    };
    if let Some(interval) = opt.interval {
        config.keeper.interval_secs = interval;
    }
    if opt.metrics {
        config.metrics.enabled = true;
    }
    if let Some(addr) = opt.metrics_addr {
        config.metrics.listen_addr = addr;
    }
    config.validate()?;

    if let Some(path) = opt.dump_config {
        config.to_file(&path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let (devnet, rx) = Devnet::from_config(&config)?;

    if config.metrics.enabled {
        let metrics_addr = config.metrics.listen_addr.parse()?;
        metrics::start_metrics_server(metrics_addr).await?;
        info!("Metrics server listening on {}", config.metrics.listen_addr);
    }

    let relayer_task = tokio::spawn(relayer::run(devnet.clone(), rx));
    let keeper_task = tokio::spawn(keeper::run(
        devnet.clone(),
        Duration::from_secs(config.keeper.interval_secs),
    ));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
        result = relayer_task => {
            if let Err(e) = result {
                error!("Relayer task failed: {}", e);
            }
        }
        result = keeper_task => {
            if let Err(e) = result {
                error!("Keeper task failed: {}", e);
            }
        }
    }

    Ok(())
}
