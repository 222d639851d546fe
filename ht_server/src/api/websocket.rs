//! WebSocket handler for the table.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. The table seats the connection and pushes `assign_id`, then a
//!    `game_state` snapshot. A full table gets `error("Game is full.")`
//!    followed by a policy-violation close frame.
//! 3. Two halves run until either side hangs up:
//!    - Send task: forwards everything the table queues for this player
//!    - Receive loop: rate-limits and decodes frames, then hands typed
//!      commands to the table
//! 4. On disconnect the player is unregistered, which folds them if a hand
//!    is running.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.onopen = () => ws.send(JSON.stringify({ type: "set_name", payload: { name: "ann" } }));
//! ws.send(JSON.stringify({ type: "player_action", payload: { action: "raise", amount: 60 } }));
//! ```

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use holdem_table::{
    ClientMessage, ServerMessage, UserError,
    entities::PlayerId,
    table::RegisterError,
};
use log::{debug, error, info, warn};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

use super::{AppState, rate_limiter::ConnectionLimits};
use crate::{logging, metrics};

/// Messages the table may queue for one connection before it starts
/// dropping them.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Upgrade an HTTP request to a player connection.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);

    let player_id = match state.table.register(outbound_tx.clone()).await {
        Ok(player_id) => player_id,
        Err(RegisterError::Rejected(e @ UserError::CapacityReached)) => {
            warn!("Rejecting connection: {e}");
            metrics::websocket_rejected_full();
            reject(&mut sender, &e.to_string()).await;
            return;
        }
        Err(e) => {
            error!("Failed to register connection: {e}");
            reject(&mut sender, &e.to_string()).await;
            return;
        }
    };

    let active = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active);
    logging::log_connection(player_id, "opened", None);

    // Forward everything the table queues for this player.
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message for player {player_id}: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    let mut limits = ConnectionLimits::default();
    let close_reason = loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut send_task => break "send task ended",
        };
        match msg {
            Some(Ok(Message::Text(text))) => {
                metrics::websocket_messages_received();
                if let Err(limited) = limits.admit() {
                    metrics::rate_limit_hits_total(limited.label());
                    logging::log_rejected_frame(player_id, limited.message());
                    reply_error(&outbound_tx, player_id, limited.message());
                    continue;
                }
                if handle_frame(&state, player_id, &outbound_tx, &text).await.is_err() {
                    break "table closed";
                }
            }
            Some(Ok(Message::Close(_))) | None => break "client closed",
            Some(Err(e)) => {
                debug!("WebSocket error for player {player_id}: {e}");
                break "socket error";
            }
            Some(Ok(_)) => {}
        }
    };

    send_task.abort();
    if state.table.unregister(player_id).await.is_err() {
        debug!("Table already closed while player {player_id} disconnected");
    }

    let active = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active);
    logging::log_connection(player_id, "closed", Some(close_reason));
}

/// Decode one text frame and pass it to the table. Protocol errors go back
/// to the sender only.
async fn handle_frame(
    state: &AppState,
    player_id: PlayerId,
    outbound: &mpsc::Sender<ServerMessage>,
    text: &str,
) -> Result<(), holdem_table::table::TableClosed> {
    match ClientMessage::decode(text) {
        Ok(ClientMessage::SetName { name }) => {
            info!("Player {player_id} set_name");
            state.table.set_name(player_id, name).await
        }
        Ok(ClientMessage::PlayerAction { action }) => {
            debug!("Player {player_id} sent {action}");
            state.table.take_action(player_id, action).await
        }
        Err(e) => {
            logging::log_rejected_frame(player_id, &e.to_string());
            reply_error(outbound, player_id, &e.to_string());
            Ok(())
        }
    }
}

fn reply_error(outbound: &mpsc::Sender<ServerMessage>, player_id: PlayerId, message: &str) {
    if outbound.try_send(ServerMessage::error(message)).is_err() {
        warn!("Player {player_id} outbound queue full, dropping error reply");
    }
}

/// Tell a connection why it can't be seated, then close it.
async fn reject(sender: &mut SplitSink<WebSocket, Message>, message: &str) {
    if let Ok(json) = ServerMessage::error(message).to_json() {
        let _ = sender.send(Message::Text(json.into())).await;
    }
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: message.to_string().into(),
        })))
        .await;
}
