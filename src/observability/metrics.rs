//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (requests, latency, upstream attempts, limiter size)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `doh_relay_requests_total` (counter): relay requests by method, outcome
//! - `doh_relay_request_duration_seconds` (histogram): end-to-end latency
//! - `doh_relay_upstream_attempts_total` (counter): attempts by provider, result
//! - `doh_relay_upstream_duration_seconds` (histogram): per-attempt latency
//! - `doh_relay_rate_limited_total` (counter): rejected admissions
//! - `doh_relay_rate_limit_entries` (gauge): tracked client keys
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library code and
//!   tests never need to set one up

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished relay request.
pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    counter!(
        "doh_relay_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("doh_relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream attempt.
pub fn record_upstream_attempt(provider: &str, result: &'static str, start: Instant) {
    counter!(
        "doh_relay_upstream_attempts_total",
        "provider" => provider.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!("doh_relay_upstream_duration_seconds", "provider" => provider.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("doh_relay_rate_limited_total").increment(1);
}

pub fn record_rate_limit_entries(entries: usize) {
    gauge!("doh_relay_rate_limit_entries").set(entries as f64);
}
