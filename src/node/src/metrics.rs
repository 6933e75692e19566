//! Metrics for the devnet node.

use crate::errors::NodeError;
use lazy_static::lazy_static;
use prometheus::{register_counter, register_gauge, Counter, Encoder, Gauge, Opts, TextEncoder};
use std::net::SocketAddr;
use tracing::error;
use warp::Filter;

lazy_static! {
    /// Counter for the number of packets delivered to the hub or a gateway.
    pub static ref PACKETS_DELIVERED: Counter = register_counter!(
        Opts::new(
            "teleport_packets_delivered_total",
            "Total number of packets delivered"
        )
    )
    .expect("packets delivered counter");

    /// Counter for the number of packets their destination rejected.
    pub static ref DELIVERY_FAILURES: Counter = register_counter!(
        Opts::new(
            "teleport_delivery_failures_total",
            "Total number of packets rejected at delivery"
        )
    )
    .expect("delivery failures counter");

    /// Counter for the number of aggregation root broadcasts.
    pub static ref BROADCASTS: Counter = register_counter!(
        Opts::new(
            "teleport_broadcasts_total",
            "Total number of aggregation root broadcasts"
        )
    )
    .expect("broadcasts counter");

    /// Counter for the number of transfer root relays.
    pub static ref RELAYS: Counter = register_counter!(
        Opts::new(
            "teleport_relays_total",
            "Total number of transfer root relays"
        )
    )
    .expect("relays counter");

    /// Gauge for the sequence number of the latest broadcast.
    pub static ref AGG_SEQ: Gauge = register_gauge!(
        Opts::new(
            "teleport_aggregation_sequence",
            "Sequence number of the latest aggregation root broadcast"
        )
    )
    .expect("aggregation sequence gauge");
}

/// Renders every registered metric in the Prometheus text format.
pub fn render() -> Result<String, NodeError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| NodeError::MetricsError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| NodeError::MetricsError(e.to_string()))
}

/// Starts the metrics server.
pub async fn start_metrics_server(addr: SocketAddr) -> Result<(), NodeError> {
    // Touch every metric so it is exported before its first update
    lazy_static::initialize(&PACKETS_DELIVERED);
    lazy_static::initialize(&DELIVERY_FAILURES);
    lazy_static::initialize(&BROADCASTS);
    lazy_static::initialize(&RELAYS);
    lazy_static::initialize(&AGG_SEQ);

    let metrics_route = warp::path("metrics").map(|| match render() {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            String::new()
        }
    });

    tokio::spawn(async move {
        warp::serve(metrics_route).run(addr).await;
    });

    Ok(())
}
