//! Metrics collection and exposition.
//!
//! # Metrics
//! - `autoresponder_lookups_total` (counter): lookups by `result` (hit, miss)
//! - `autoresponder_reloads_total` (counter): reloads by `outcome` (ok, error)
//! - `autoresponder_rules` (gauge): rules in the active set

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("autoresponder_lookups_total", "result" => result).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!("autoresponder_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_rule_count(count: usize) {
    ::metrics::gauge!("autoresponder_rules").set(count as f64);
}
