//! Structured logging configuration.
//!
//! The table engine logs through the `log` facade; `tracing-subscriber`
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Initialize structured logging
///
/// Features:
/// - Configurable log levels via RUST_LOG env var
/// - Target, thread id, file and line on every record
/// - `log` records from `holdem_table` routed into the subscriber
///
/// # Example
///
/// ```no_run
/// use ht_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // `init` also installs the log-to-tracing bridge (tracing-log feature).
    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {e}");
        return;
    }

    tracing::info!("Structured logging initialized");
}

/// Log a connection lifecycle event with structured fields
pub fn log_connection(player_id: u32, event: &str, detail: Option<&str>) {
    tracing::info!(
        player_id = player_id,
        event = event,
        detail = detail,
        "Connection {}",
        event
    );
}

/// Log a frame that was refused before reaching the table
pub fn log_rejected_frame(player_id: u32, reason: &str) {
    tracing::warn!(player_id = player_id, reason = reason, "Frame rejected");
}
