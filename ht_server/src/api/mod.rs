//! HTTP/WebSocket API for the table server.
//!
//! # Endpoints
//!
//! - `GET /ws` - Play at the table over a WebSocket
//! - `GET /health` - Server health and a public table summary
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ht_server::api::{AppState, create_router};
//! use holdem_table::{TableActor, TableConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (actor, table) = TableActor::new(TableConfig::default());
//! tokio::spawn(actor.run());
//!
//! let app = create_router(AppState::new(table));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod rate_limiter;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use holdem_table::TableHandle;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the table actor
    pub table: TableHandle,
    /// Open WebSocket connections
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(table: TableHandle) -> Self {
        Self {
            table,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` while the table actor answers, or
/// `503 Service Unavailable` once it has stopped.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","connections":2,"table":{...},"timestamp":"2026-10-17T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.table.summary().await.ok();
    let healthy = summary.is_some();

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.connections.load(Ordering::Relaxed),
        "table": summary,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
