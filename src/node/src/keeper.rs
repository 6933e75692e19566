//! Periodic driver of the reserve, relay and broadcast calls.

use crate::errors::NodeError;
use crate::{lock, metrics, Devnet};
use std::time::Duration;
use teleport_core::types::EndpointId;
use tracing::{debug, error, info, warn};

/// What one keeper round did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Reserved transfer index per gateway
    pub reserved: Vec<(EndpointId, u64)>,
    /// Gateways whose latest proved root was relayed
    pub relayed: Vec<EndpointId>,
    /// Sequence number of the broadcast, if one was sent
    pub broadcast: Option<u64>,
}

/// Runs one keeper round.
///
/// Every gateway reserves its current hash chain and relays if its latest
/// proved root has not been relayed yet. The hub then broadcasts to every
/// registered chain if any slot changed. A failed relay or broadcast is
/// logged and left for the next round.
pub fn tick(devnet: &Devnet) -> Result<TickReport, NodeError> {
    let owner = devnet.owner();
    let keeper = *devnet.keeper();
    let mut report = TickReport::default();

    for (&eid, gateway) in devnet.gateways() {
        let mut gateway = lock(gateway, "gateway")?;
        let (index, _) = gateway.reserve_hash_chain();
        report.reserved.push((eid, index));

        if gateway.is_up_to_date() {
            continue;
        }
        match gateway.relay_transfer_root(&[], keeper.relay_value, &owner) {
            Ok(receipt) => {
                debug!("Endpoint {} relayed index {} (nonce {})", eid, gateway.latest_relayed_index(), receipt.nonce);
                metrics::RELAYS.inc();
                report.relayed.push(eid);
            }
            Err(e) => warn!("Relay from endpoint {} failed: {}", eid, e),
        }
    }

    let mut hub = lock(devnet.hub(), "hub")?;
    if !hub.is_up_to_date() {
        let targets = hub.registered_eids();
        match hub.broadcast(&targets, &[], keeper.broadcast_value, &owner) {
            Ok(receipt) => {
                metrics::BROADCASTS.inc();
                metrics::AGG_SEQ.set(receipt.agg_seq as f64);
                report.broadcast = Some(receipt.agg_seq);
            }
            Err(e) => warn!("Broadcast failed: {}", e),
        }
    }

    Ok(report)
}

/// Runs keeper rounds forever, one every `period`.
pub async fn run(devnet: Devnet, period: Duration) {
    info!("Keeper started, one round every {:?}", period);
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match tick(&devnet) {
            Ok(report) => debug!("Keeper round: {:?}", report),
            Err(e) => error!("Keeper round failed: {}", e),
        }
    }
}
