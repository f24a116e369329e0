//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, lookups, forward errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_registry_lookups_total` (counter): lookups by outcome
//! - `gateway_forward_errors_total` (counter): exchange failures by class
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels for method, status code, service

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "service" => service.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
        "service" => service.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a registry lookup outcome (`found`, `empty`, `error`).
pub fn record_registry_lookup(outcome: &'static str) {
    metrics::counter!("gateway_registry_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a failed exchange, classified by the error hook.
pub fn record_forward_error(class: &'static str) {
    metrics::counter!("gateway_forward_errors_total", "class" => class).increment(1);
}
