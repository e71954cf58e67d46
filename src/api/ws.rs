//! WebSocket endpoint for real-time execution monitoring.
//!
//! Each connection subscribes to the hub and receives every execution's
//! events as JSON text frames. The only inbound control message is
//! `{"type":"ping"}`, answered with `{"type":"pong"}`. A failing session
//! is torn down in isolation; it never affects the runner or its peers.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use super::AppState;

/// GET /ws
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket client connected");
    let mut events = state.hub.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to encode event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Slow consumer: skipped events are accepted loss.
                    tracing::debug!(skipped, "observer session lagged");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_client_message(&text) {
                        if sink.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "WebSocket receive error");
                    break;
                }
            },
        }
    }

    tracing::info!("WebSocket client disconnected");
}

/// Liveness handshake only; anything unparseable is ignored.
fn handle_client_message(text: &str) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed client message");
            return None;
        }
    };
    if value.get("type").and_then(|t| t.as_str()) == Some("ping") {
        return Some(r#"{"type":"pong"}"#.to_string());
    }
    None
}
