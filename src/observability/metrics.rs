//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_rejected_total` (counter): rejections by guard, operation
//! - `gatekeeper_requests_admitted_total` (counter): requests reaching the handler
//! - `gatekeeper_rate_limit_keys` (gauge): tracked rate-limit windows

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rejection(guard: &'static str, operation: &str) {
    metrics::counter!(
        "gatekeeper_requests_rejected_total",
        "guard" => guard,
        "operation" => operation.to_string()
    )
    .increment(1);
}

pub fn record_admission(operation: &str) {
    metrics::counter!(
        "gatekeeper_requests_admitted_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    metrics::gauge!("gatekeeper_rate_limit_keys").set(count as f64);
}
