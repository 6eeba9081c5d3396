//! Real-time WebSocket API for spectators.
//!
//! This module provides the WebSocket endpoint and the read-only HTTP
//! endpoints that describe the real-time state:
//!
//! - `/ws` - Main WebSocket endpoint for live events
//! - `/api/realtime/stats` - Statistics about real-time connections
//! - `/api/realtime/rooms` - Occupied rooms and their member counts
//!
//! ## WebSocket Protocol
//!
//! Clients join rooms to choose which events they receive:
//!
//! ```json
//! // Follow a match
//! {"type": "join:match", "id": 7}
//!
//! // Stop following it
//! {"type": "leave:match", "id": 7}
//!
//! // Follow an agent across matches
//! {"type": "join:agent", "address": "0xabc..."}
//!
//! // Post to a match's chat
//! {"type": "chat:send", "matchId": 7, "text": "gg", "sender": "0xabc..."}
//!
//! // Ping for keepalive
//! {"type": "ping"}
//! ```
//!
//! Delivered events arrive as `{"type": "event", "event": "...", "data": {...}}`
//! frames; see [`crate::protocol::EventFrame`].

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::api::AppState;
use crate::bridge::RealtimeBridge;
use crate::protocol::{ClientCommand, ServerMessage};
use agon_realtime::OutboundFrame;

/// Create the real-time API routes.
pub fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/realtime/stats", get(get_stats))
        .route("/api/realtime/rooms", get(get_rooms))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.bridge.clone()))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, bridge: Arc<RealtimeBridge>) {
    // Register with the bridge; this also queues the welcome frame.
    let (connection, mut receiver) = match bridge.register_connection() {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to accept connection: {}", e);
            return;
        }
    };

    let connection_id = connection.id.clone();
    info!(connection_id = %connection_id, "WebSocket client connected");

    // Split the WebSocket into sender and receiver
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Spawn a task to forward queued frames to the WebSocket
    let connection_id_clone = connection_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            match frame {
                OutboundFrame::Message(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
        debug!(connection_id = %connection_id_clone, "Send task ended");
    });

    // Handle incoming messages from the WebSocket
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let text_str: &str = &text;
                match serde_json::from_str::<ClientCommand>(text_str) {
                    Ok(command) => {
                        if let Some(reply) = bridge.handle_command(&connection, command) {
                            if let Ok(json) = serde_json::to_string(&reply) {
                                let _ = connection.send(json);
                            }
                        }
                    }
                    Err(e) => {
                        debug!(connection_id = %connection_id, error = %e, "Invalid command");
                        let reply = ServerMessage::Error {
                            message: format!("invalid command: {}", e),
                        };
                        if let Ok(json) = serde_json::to_string(&reply) {
                            let _ = connection.send(json);
                        }
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "WebSocket close received");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Axum handles pong automatically, but log it
                debug!(connection_id = %connection_id, "Ping received, len={}", data.len());
            }
            Ok(Message::Pong(_)) => {
                // Ignore pong
            }
            Ok(Message::Binary(_)) => {
                // We don't support binary messages
                debug!(connection_id = %connection_id, "Binary message ignored");
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    bridge.on_disconnect(&connection_id);
    info!(connection_id = %connection_id, "WebSocket client disconnected");
}

/// Statistics response.
#[derive(Serialize)]
struct StatsResponse {
    current_connections: usize,
    total_connections: u64,
    total_events: u64,
    total_chat_messages: u64,
    active_rooms: usize,
}

/// Get real-time connection statistics.
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.bridge.stats();
    Json(StatsResponse {
        current_connections: stats.current_connections,
        total_connections: stats.total_connections,
        total_events: stats.total_events,
        total_chat_messages: stats.total_chat_messages,
        active_rooms: stats.active_rooms,
    })
}

/// Room occupancy entry.
#[derive(Serialize)]
struct RoomInfo {
    room: String,
    members: usize,
}

/// List every room that currently has members.
async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms: Vec<RoomInfo> = state
        .bridge
        .registry()
        .rooms_with_counts()
        .into_iter()
        .map(|(room, members)| RoomInfo { room, members })
        .collect();
    Json(rooms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialization() {
        let stats = StatsResponse {
            current_connections: 10,
            total_connections: 100,
            total_events: 1000,
            total_chat_messages: 50,
            active_rooms: 4,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"current_connections\":10"));
        assert!(json.contains("\"total_events\":1000"));
    }

    #[test]
    fn test_room_info_serialization() {
        let info = RoomInfo {
            room: "match:7".to_string(),
            members: 3,
        };

        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"room":"match:7","members":3}"#);
    }
}
