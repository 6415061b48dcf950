//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_reconcile_total` (counter): cycles by outcome
//! - `router_reconcile_duration_seconds` (histogram): build + write latency
//! - `router_pools` (gauge): pools in the last built snapshot
//! - `router_rules` (gauge): rules in the last built snapshot
//! - `router_skipped_total` (counter): dropped inputs by reason
//! - `router_coalesced_updates_total` (counter): notifications folded into
//!   an already scheduled cycle
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished reconciliation cycle.
pub fn record_reconcile(outcome: &'static str, start: Instant) {
    ::metrics::counter!("router_reconcile_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("router_reconcile_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record the size of the last built snapshot.
pub fn record_resources(pools: usize, rules: usize) {
    ::metrics::gauge!("router_pools").set(pools as f64);
    ::metrics::gauge!("router_rules").set(rules as f64);
}

/// Record an input dropped during reconciliation.
pub fn record_skipped(reason: &'static str) {
    ::metrics::counter!("router_skipped_total", "reason" => reason).increment(1);
}

/// Record notifications coalesced into one cycle.
pub fn record_coalesced(count: u64) {
    if count > 0 {
        ::metrics::counter!("router_coalesced_updates_total").increment(count);
    }
}
