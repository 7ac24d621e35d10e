//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define site metrics (requests, latency, routing misses, queries)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `site_requests_total` (counter): requests by method, status, route
//! - `site_request_duration_seconds` (histogram): latency by route
//! - `site_routing_misses_total` (counter): requests no grammar accepted
//! - `site_db_queries_total` (counter): statements by outcome
//! - `site_db_connections_released_total` (counter): request-scoped releases
//! - `site_external_calls_total` (counter): outbound calls by service, outcome
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op (tests, CLI)
//! - Labels are low-cardinality: route names, not paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "site_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    histogram!("site_request_duration_seconds", "route" => route).record(start.elapsed().as_secs_f64());
}

pub fn record_routing_miss() {
    counter!("site_routing_misses_total").increment(1);
}

pub fn record_db_query(outcome: &'static str) {
    counter!("site_db_queries_total", "outcome" => outcome).increment(1);
}

pub fn record_db_release() {
    counter!("site_db_connections_released_total").increment(1);
}

pub fn record_external_call(service: &'static str, outcome: &'static str) {
    counter!("site_external_calls_total", "service" => service, "outcome" => outcome).increment(1);
}
