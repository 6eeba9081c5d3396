//! Wire protocol for the spectator WebSocket API.
//!
//! Every frame in both directions is a JSON object with a `type` field.
//! Commands use namespaced tags (`join:match`, `chat:send`) and camelCase
//! payload keys to match the platform's web clients.

use agon_types::{ChatMessage, GameEvent, Room};
use serde::{Deserialize, Serialize};

/// Commands that spectator clients can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Subscribe to a tournament room.
    #[serde(rename = "join:tournament")]
    JoinTournament { id: u64 },
    /// Leave a tournament room.
    #[serde(rename = "leave:tournament")]
    LeaveTournament { id: u64 },
    /// Subscribe to a match room.
    #[serde(rename = "join:match")]
    JoinMatch { id: u64 },
    /// Leave a match room.
    #[serde(rename = "leave:match")]
    LeaveMatch { id: u64 },
    /// Subscribe to an agent's activity room.
    #[serde(rename = "join:agent")]
    JoinAgent { address: String },
    /// Leave an agent's activity room.
    #[serde(rename = "leave:agent")]
    LeaveAgent { address: String },
    /// Ping for keepalive.
    Ping,
    /// Post a chat message to a match room.
    #[serde(rename = "chat:send", rename_all = "camelCase")]
    ChatSend {
        match_id: i64,
        text: String,
        sender: String,
    },
    /// Fetch recent chat history for a match room.
    #[serde(rename = "chat:history", rename_all = "camelCase")]
    ChatHistory { match_id: i64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome frame carrying the assigned connection id.
    #[serde(rename_all = "camelCase")]
    Connected {
        connection_id: String,
        rooms: Vec<String>,
    },
    /// Full room list after a join or leave.
    Subscriptions { rooms: Vec<String> },
    /// Pong response to ping.
    #[serde(rename_all = "camelCase")]
    Pong { server_time_ms: u64 },
    /// Recent messages for a match room.
    #[serde(rename = "chat:history", rename_all = "camelCase")]
    ChatHistory {
        match_id: u64,
        messages: Vec<ChatMessage>,
    },
    /// A chat command was rejected.
    #[serde(rename = "chat:error")]
    ChatError { message: String },
    /// A command failed.
    Error { message: String },
}

/// Envelope for a game event fanned out to subscribers.
///
/// The event itself flattens into `event`/`data` keys, so a delivered
/// frame looks like:
///
/// ```json
/// {"type":"event","event":"match:created","data":{...},"rooms":["match:7"],"timestamp":...,"eventId":"..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrame {
    /// Always `"event"`, so clients switch on the same field as replies.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// The game event being delivered.
    #[serde(flatten)]
    pub event: GameEvent,
    /// Canonical names of the rooms this frame was routed to.
    pub rooms: Vec<String>,
    /// Server timestamp in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Unique id for this delivery.
    pub event_id: String,
}

impl EventFrame {
    /// Wraps an event for delivery to the given rooms.
    pub fn new(event: GameEvent, rooms: &[Room]) -> Self {
        Self {
            frame_type: "event".to_string(),
            event,
            rooms: rooms.iter().map(|room| room.name()).collect(),
            timestamp: epoch_ms(),
            event_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
