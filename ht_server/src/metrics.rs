//! Prometheus metrics for monitoring table health.
//!
//! When a metrics address is configured, an exporter serves the text
//! format at `http://<addr>/metrics`. Without one, every recording call
//! below is a no-op.
//!
//! # Metrics
//!
//! - **WebSocket**: active connections, total connections, messages in/out
//! - **Table**: seated players, hands started
//! - **Rate limiting**: frames refused per limiter

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// Connections turned away because every seat was taken.
pub fn websocket_rejected_full() {
    metrics::counter!("websocket_rejected_full_total").increment(1);
}

// ============================================================================
// Table Metrics
// ============================================================================

/// Set current seated players count.
pub fn active_players(count: usize) {
    metrics::gauge!("active_players").set(count as f64);
}

/// Add newly started hands to the counter.
pub fn hands_started(count: u64) {
    metrics::counter!("hands_started_total").increment(count);
}

/// Record the pot size as last observed.
pub fn pot_size_chips(size: u32) {
    metrics::gauge!("pot_size_chips").set(f64::from(size));
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(limiter: &str) {
    metrics::counter!("rate_limit_hits_total",
        "limiter" => limiter.to_string()
    )
    .increment(1);
}
