//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): bridged requests by final status
//! - `relay_request_duration_seconds` (histogram): bridge latency
//! - `relay_redirects_total` (counter): redirects followed
//! - `relay_address_changes_total` (counter): backend address swaps
//! - `relay_forward_errors_total` (counter): failed forwards by error kind
//! - `relay_backend_requests_total` (counter): backend tier outcomes
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a bridged request and its latency.
pub fn record_request(status: u16, start: Instant) {
    ::metrics::counter!("relay_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_redirect() {
    ::metrics::counter!("relay_redirects_total").increment(1);
}

pub fn record_address_change() {
    ::metrics::counter!("relay_address_changes_total").increment(1);
}

pub fn record_forward_error(kind: &'static str) {
    ::metrics::counter!("relay_forward_errors_total", "kind" => kind).increment(1);
}

/// Record how the backend tier answered (`processed`, `redirected`, `rejected`).
pub fn record_backend_request(outcome: &'static str) {
    ::metrics::counter!("relay_backend_requests_total", "outcome" => outcome).increment(1);
}
