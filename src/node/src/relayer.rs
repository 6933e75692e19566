//! Delivers packets from the shared channel to the hub or a gateway.
//!
//! Delivery is at most once per packet taken from the channel: a packet its
//! destination rejects is logged, counted and dropped.

use crate::errors::NodeError;
use crate::{lock, metrics, Devnet};
use teleport_network::Packet;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Hands one packet to its destination.
pub fn deliver(devnet: &Devnet, packet: &Packet) -> Result<(), NodeError> {
    if packet.dst_eid == devnet.hub_eid() {
        let mut hub = lock(devnet.hub(), "hub")?;
        hub.receive_root_update(&packet.origin, &packet.payload)?;
    } else {
        let mut gateway = lock(devnet.gateway(packet.dst_eid)?, "gateway")?;
        gateway.receive_global_root(&packet.origin, &packet.payload)?;
    }
    Ok(())
}

fn deliver_and_count(devnet: &Devnet, packet: &Packet) -> bool {
    match deliver(devnet, packet) {
        Ok(()) => {
            debug!("Delivered {}", packet);
            metrics::PACKETS_DELIVERED.inc();
            true
        }
        Err(e) => {
            warn!("Failed to deliver {}: {}", packet, e);
            metrics::DELIVERY_FAILURES.inc();
            false
        }
    }
}

/// Delivers every packet already queued, without waiting for more.
///
/// Returns the number of packets delivered and the number rejected.
pub fn flush(devnet: &Devnet, rx: &mut UnboundedReceiver<Packet>) -> (usize, usize) {
    let mut delivered = 0;
    let mut failed = 0;
    while let Ok(packet) = rx.try_recv() {
        if deliver_and_count(devnet, &packet) {
            delivered += 1;
        } else {
            failed += 1;
        }
    }
    (delivered, failed)
}

/// Delivers packets until every sender is gone.
pub async fn run(devnet: Devnet, mut rx: UnboundedReceiver<Packet>) {
    info!("Relayer started");
    while let Some(packet) = rx.recv().await {
        deliver_and_count(&devnet, &packet);
    }
    info!("Packet channel closed, relayer stopping");
}
