//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guiproxy_requests_total` (counter): requests by route kind, status
//! - `guiproxy_request_duration_seconds` (histogram): time to response by route kind
//! - `guiproxy_tunnels_active` (gauge): open WebSocket tunnels
//! - `guiproxy_tunnels_total` (counter): tunnels opened by route kind
//! - `guiproxy_tunnel_endings_total` (counter): tunnels closed by ending side
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Tunnel duration is excluded from request latency (it ends at upgrade)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "guiproxy_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("guiproxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a tunnel becoming live.
pub fn tunnel_opened(route: &'static str) {
    metrics::counter!("guiproxy_tunnels_total", "route" => route).increment(1);
    metrics::gauge!("guiproxy_tunnels_active").increment(1.0);
}

/// Record a tunnel ending.
pub fn tunnel_closed(end: &'static str) {
    metrics::counter!("guiproxy_tunnel_endings_total", "end" => end).increment(1);
    metrics::gauge!("guiproxy_tunnels_active").decrement(1.0);
}
