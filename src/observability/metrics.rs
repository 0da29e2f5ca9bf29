//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nrf_startup_latency_us` (histogram): recorded startup latency samples
//! - `nrf_latency_window_compactions_total` (counter): window compactions
//! - `nrf_latency_window_last_compaction_size` (gauge): samples folded by the latest compaction
//! - `nrf_lifecycle_state` (gauge): current lifecycle state ordinal

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_startup_latency(micros: i64) {
    metrics::histogram!("nrf_startup_latency_us").record(micros as f64);
}

pub fn record_compaction(drained: usize) {
    metrics::counter!("nrf_latency_window_compactions_total").increment(1);
    metrics::gauge!("nrf_latency_window_last_compaction_size").set(drained as f64);
}

pub fn set_lifecycle_state(ordinal: u8) {
    metrics::gauge!("nrf_lifecycle_state").set(f64::from(ordinal));
}
