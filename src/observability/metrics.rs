//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `gateway_circuit_breaker_transitions_total` (counter): by breaker, target state
//! - `gateway_circuit_breaker_rejections_total` (counter): calls failed fast while open
//! - `gateway_circuit_breaker_calls_total` (counter): attempted calls by outcome
//! - `gateway_fallbacks_total` (counter): fallbacks substituted, by dependency
//!
//! The macros are no-ops until a recorder is installed, so library code and
//! tests can record freely.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics listener started");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    metrics::gauge!("gateway_circuit_breaker_state", "breaker" => breaker.to_string())
        .set(state.as_gauge());
}

pub fn record_breaker_transition(breaker: &str, to: CircuitState) {
    metrics::counter!(
        "gateway_circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, to);
}

pub fn record_breaker_rejection(breaker: &str) {
    metrics::counter!("gateway_circuit_breaker_rejections_total", "breaker" => breaker.to_string())
        .increment(1);
}

pub fn record_breaker_call(breaker: &str, outcome: &'static str) {
    metrics::counter!(
        "gateway_circuit_breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fallback(dependency: &str) {
    metrics::counter!("gateway_fallbacks_total", "dependency" => dependency.to_string()).increment(1);
}

/// Axum middleware recording request count and latency per matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
