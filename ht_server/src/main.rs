//! Single-table poker server using the async actor model.
//!
//! One TableActor owns the table; every WebSocket connection talks to it
//! through a cloned TableHandle.

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Error};
use holdem_table::{TableActor, TableHandle};
use ht_server::{api, config::ServerConfig, logging, metrics};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run a single-table Texas Hold'em server

USAGE:
  ht_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address    [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus exporter address   [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:6969)
  METRICS_BIND             Prometheus exporter address (e.g., 0.0.0.0:9090)
  TABLE_NAME               Table name shown in /health
  MAX_PLAYERS              Seats at the table (2-22)
  STARTING_STACK           Chips each player sits down with
  SMALL_BLIND, BIG_BLIND   Blind amounts
  ACTION_TIMEOUT_SECS      Seconds to act before an automatic fold
  HAND_END_DELAY_SECS      Pause between hands
  MAX_NAME_LENGTH          Longest accepted display name
  RUST_LOG                 Log filter (e.g., info,holdem_table=debug)
";

/// How often table gauges are refreshed for the exporter
const METRICS_POLL: Duration = Duration::from_secs(5);

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.metrics_bind)?;
    info!(
        "Starting table '{}' ({} seats, blinds {}/{}) at {}",
        config.table.name,
        config.table.max_players,
        config.table.small_blind,
        config.table.big_blind,
        config.bind
    );

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{addr}/metrics");
    }

    let (actor, table) = TableActor::new(config.table.clone());
    let actor_task = tokio::spawn(actor.run());
    if config.metrics_bind.is_some() {
        tokio::spawn(poll_table_metrics(table.clone()));
    }

    let app = api::create_router(api::AppState::new(table.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at ws://{}/ws. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if table.close().await.is_err() {
        warn!("Table actor had already stopped");
    }
    let _ = actor_task.await;

    Ok(())
}

/// Mirror the table summary into gauges and count newly started hands.
async fn poll_table_metrics(table: TableHandle) {
    let mut seen_hands = 0;
    let mut interval = tokio::time::interval(METRICS_POLL);
    loop {
        interval.tick().await;
        let Ok(summary) = table.summary().await else {
            break;
        };
        metrics::active_players(summary.player_count);
        metrics::pot_size_chips(summary.pot_size);
        if summary.hand_number > seen_hands {
            metrics::hands_started(summary.hand_number - seen_hands);
            seen_hands = summary.hand_number;
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
