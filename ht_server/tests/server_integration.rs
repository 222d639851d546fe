//! Integration tests for the HTTP/WebSocket server.
//!
//! `/health` is driven through the router directly; WebSocket tests bind a
//! real listener on an ephemeral port and connect with tokio-tungstenite.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use holdem_table::{TableActor, TableConfig, TableHandle};
use ht_server::api::{AppState, create_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::frame::coding::CloseCode},
};
use tower::ServiceExt; // For `oneshot` method

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn spawn_table(config: TableConfig) -> TableHandle {
    let (actor, handle) = TableActor::new(config);
    tokio::spawn(actor.run());
    handle
}

/// Serve the router on an ephemeral port
async fn spawn_server(config: TableConfig) -> (SocketAddr, TableHandle) {
    let table = spawn_table(config);
    let app = create_router(AppState::new(table.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, table)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Next text frame as JSON
async fn next_json(ws: &mut Client) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .expect("no frame within 5s")
}

/// Skip frames until one of type `kind` arrives
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    loop {
        let frame = next_json(ws).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_router(AppState::new(spawn_table(TableConfig {
        name: "Test Table".to_string(),
        ..Default::default()
    })));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["table"]["table_name"], "Test Table");
    assert_eq!(json["table"]["stage"], "idle");
    assert_eq!(json["table"]["big_blind"], 20);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_reports_closed_table() {
    let table = spawn_table(TableConfig::default());
    table.close().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let app = create_router(AppState::new(table));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_router(AppState::new(spawn_table(TableConfig::default())));
    let request = Request::builder()
        .uri("/api/tables")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// WebSocket Tests
// ============================================================================

#[tokio::test]
async fn test_connect_gets_id_then_state() {
    let (addr, _) = spawn_server(TableConfig::default()).await;
    let mut ws = connect(addr).await;

    let assign = next_json(&mut ws).await;
    assert_eq!(assign, json!({"type": "assign_id", "payload": {"playerId": 1}}));

    let state = next_json(&mut ws).await;
    assert_eq!(state["type"], "game_state");
    assert_eq!(state["payload"]["game_stage"], "idle");
    assert_eq!(state["payload"]["bigBlind"], 20);
    assert_eq!(state["payload"]["players"]["1"]["name"], "Player 1");
}

#[tokio::test]
async fn test_two_named_players_start_a_hand() {
    let (addr, table) = spawn_server(TableConfig::default()).await;
    let mut ann = connect(addr).await;
    let mut bob = connect(addr).await;
    let ann_id = next_of_type(&mut ann, "assign_id").await["payload"]["playerId"].clone();
    next_of_type(&mut bob, "assign_id").await;

    send(&mut ann, json!({"type": "set_name", "payload": {"name": "  ann  "}})).await;
    send(&mut bob, json!({"type": "set_name", "payload": {"name": "bob"}})).await;

    let started = next_of_type(&mut ann, "game_message").await;
    let message = started["payload"]["message"].as_str().unwrap();
    assert!(message.starts_with("--- Starting New Hand --- Dealer: "), "{message}");
    let summary = table.summary().await.unwrap();
    assert_eq!(summary.named_count, 2);
    assert_eq!(summary.hand_number, 1);

    // Whoever is prompted acts; the other sees the action.
    let view = table.view(None).await.unwrap();
    let current = view.current_player_id.unwrap();
    let (actor, watcher) = if ann_id == current { (&mut ann, &mut bob) } else { (&mut bob, &mut ann) };
    let turn = next_of_type(actor, "player_turn").await;
    assert_eq!(turn["payload"]["playerId"], current);
    assert_eq!(turn["payload"]["callAmount"], 10);

    send(actor, json!({"type": "player_action", "payload": {"action": "call"}})).await;
    let action = next_of_type(watcher, "player_action").await;
    assert_eq!(action["payload"]["playerId"], current);
    assert_eq!(action["payload"]["action"], "call");
    assert_eq!(action["payload"]["amount"], 20);
}

#[tokio::test]
async fn test_protocol_errors_go_to_sender() {
    let (addr, _) = spawn_server(TableConfig::default()).await;
    let mut ws = connect(addr).await;
    next_of_type(&mut ws, "assign_id").await;

    ws.send(Message::text("not json")).await.unwrap();
    let error = next_of_type(&mut ws, "error").await;
    assert_eq!(error["payload"]["message"], "Invalid JSON format.");

    send(&mut ws, json!({"type": "chat", "payload": {}})).await;
    let error = next_of_type(&mut ws, "error").await;
    assert_eq!(error["payload"]["message"], "Unknown message type received: chat");

    send(&mut ws, json!({"type": "player_action", "payload": {"action": "bet", "amount": "lots"}})).await;
    let error = next_of_type(&mut ws, "error").await;
    assert_eq!(error["payload"]["message"], "Invalid action amount provided.");
}

#[tokio::test]
async fn test_full_table_closes_with_policy() {
    let (addr, _) = spawn_server(TableConfig {
        max_players: 2,
        ..Default::default()
    })
    .await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_of_type(&mut first, "assign_id").await;
    next_of_type(&mut second, "assign_id").await;

    let mut third = connect(addr).await;
    let error = next_json(&mut third).await;
    assert_eq!(error, json!({"type": "error", "payload": {"message": "Game is full."}}));

    let close = timeout(Duration::from_secs(5), async {
        loop {
            match third.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(close.map(|frame| frame.code), Some(CloseCode::Policy));
}

#[tokio::test]
async fn test_rate_limit_replies_with_error() {
    let (addr, _) = spawn_server(TableConfig::default()).await;
    let mut ws = connect(addr).await;
    next_of_type(&mut ws, "assign_id").await;

    // Out-of-hand actions are harmless; the eleventh frame in a second is refused.
    for _ in 0..11 {
        send(&mut ws, json!({"type": "player_action", "payload": {"action": "check"}})).await;
    }
    loop {
        let error = next_of_type(&mut ws, "error").await;
        if error["payload"]["message"] == "Rate limit exceeded. Please slow down." {
            break;
        }
    }
}

#[tokio::test]
async fn test_disconnect_frees_the_seat() {
    let (addr, table) = spawn_server(TableConfig {
        max_players: 2,
        ..Default::default()
    })
    .await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_of_type(&mut first, "assign_id").await;
    next_of_type(&mut second, "assign_id").await;

    second.close(None).await.unwrap();
    timeout(Duration::from_secs(5), async {
        while table.summary().await.unwrap().player_count != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let mut third = connect(addr).await;
    let assign = next_of_type(&mut third, "assign_id").await;
    assert_eq!(assign["payload"]["playerId"], 3);
}
