//! Connection handles and the live connection table.

use crate::error::RealtimeError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unique identifier for a connected client.
pub type ConnectionId = String;

/// Default maximum concurrent connections.
pub const MAX_CONNECTIONS: usize = 10_000;

/// A frame queued for delivery to one connection's socket task.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// A serialized JSON message.
    Message(String),
    /// Ask the socket task to close the connection.
    Close,
}

/// A connected WebSocket client.
///
/// The connection owns the sending half of an unbounded channel; the socket
/// task drains the receiving half and writes frames to the wire. Sends never
/// block, so a slow consumer cannot stall the broadcast path.
#[derive(Debug)]
pub struct Connection {
    /// Unique connection identifier.
    pub id: ConnectionId,
    /// Channel for queuing frames to this connection.
    sender: mpsc::UnboundedSender<OutboundFrame>,
    /// When the connection was accepted (Unix timestamp, milliseconds).
    pub connected_at_ms: u64,
    /// Last inbound activity (Unix timestamp, milliseconds).
    last_activity_ms: AtomicU64,
}

impl Connection {
    /// Create a new connection with a frame sender.
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        let now = epoch_ms();
        Self {
            id,
            sender,
            connected_at_ms: now,
            last_activity_ms: AtomicU64::new(now),
        }
    }

    /// Queue a serialized message for this connection.
    pub fn send(&self, message: String) -> Result<(), RealtimeError> {
        self.sender
            .send(OutboundFrame::Message(message))
            .map_err(|_| RealtimeError::ChannelClosed)
    }

    /// Ask the socket task to close this connection.
    pub fn close(&self) -> Result<(), RealtimeError> {
        self.sender
            .send(OutboundFrame::Close)
            .map_err(|_| RealtimeError::ChannelClosed)
    }

    /// Record inbound activity on this connection.
    pub fn touch(&self) {
        self.last_activity_ms.store(epoch_ms(), Ordering::Relaxed);
    }

    /// Last inbound activity (Unix timestamp, milliseconds).
    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last inbound activity.
    pub fn idle_ms(&self) -> u64 {
        epoch_ms().saturating_sub(self.last_activity_ms())
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Handle for receiving frames queued for one connection.
pub type ConnectionReceiver = mpsc::UnboundedReceiver<OutboundFrame>;

/// Create a new connection with its frame receiver.
pub fn create_connection(id: ConnectionId) -> (Arc<Connection>, ConnectionReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let connection = Arc::new(Connection::new(id, sender));
    (connection, receiver)
}

/// All live connections, keyed by id.
#[derive(Debug)]
pub struct ConnectionTable {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    max_connections: usize,
}

impl ConnectionTable {
    /// Create a table with the default connection limit.
    pub fn new() -> Self {
        Self::with_limit(MAX_CONNECTIONS)
    }

    /// Create a table with a custom connection limit.
    pub fn with_limit(max_connections: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            max_connections,
        }
    }

    /// Insert a connection, rejecting it when the table is full.
    pub fn insert(&self, connection: Arc<Connection>) -> Result<(), RealtimeError> {
        let mut connections = self.connections.write();
        if connections.len() >= self.max_connections {
            return Err(RealtimeError::AtCapacity(self.max_connections));
        }
        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Look up a connection by id.
    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.read().get(id).cloned()
    }

    /// Remove a connection, returning it if it was present.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.write().remove(id)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// True when no connection is live.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Snapshot of all live connection ids.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.read().keys().cloned().collect()
    }
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}
