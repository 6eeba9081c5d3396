//! Room membership tracking.
//!
//! The registry keeps a double index: rooms per connection and connections
//! per room. The reverse index makes disconnect cleanup proportional to the
//! connection's own rooms rather than to every room on the platform.

use crate::connection::ConnectionId;
use crate::error::RealtimeError;
use agon_types::Room;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Maximum rooms a single connection can join.
pub const MAX_ROOMS_PER_CONNECTION: usize = 100;

#[derive(Debug, Default)]
struct RegistryInner {
    rooms_by_conn: HashMap<ConnectionId, HashSet<String>>,
    conns_by_room: HashMap<String, HashSet<ConnectionId>>,
}

/// Tracks which connections are members of which rooms.
///
/// Both indexes are updated under one lock, so readers never observe a room
/// membership without its reverse entry.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<RegistryInner>,
    max_rooms_per_connection: usize,
}

impl SubscriptionRegistry {
    /// Create a registry with the default per-connection room limit.
    pub fn new() -> Self {
        Self::with_room_limit(MAX_ROOMS_PER_CONNECTION)
    }

    /// Create a registry with a custom per-connection room limit.
    pub fn with_room_limit(max_rooms_per_connection: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            max_rooms_per_connection,
        }
    }

    /// Add a connection to a room.
    ///
    /// Returns `Ok(true)` when the membership is new, `Ok(false)` when the
    /// connection was already a member. Joining past the room limit fails
    /// without changing any state.
    pub fn join(&self, connection_id: &str, room: &Room) -> Result<bool, RealtimeError> {
        let name = room.name();
        let mut inner = self.inner.write();

        let rooms = inner
            .rooms_by_conn
            .entry(connection_id.to_string())
            .or_default();
        if rooms.contains(&name) {
            return Ok(false);
        }
        if rooms.len() >= self.max_rooms_per_connection {
            return Err(RealtimeError::RoomLimit(self.max_rooms_per_connection));
        }
        rooms.insert(name.clone());

        inner
            .conns_by_room
            .entry(name)
            .or_default()
            .insert(connection_id.to_string());
        Ok(true)
    }

    /// Remove a connection from a room.
    ///
    /// Returns true when a membership was actually removed.
    pub fn leave(&self, connection_id: &str, room: &Room) -> bool {
        let name = room.name();
        let mut inner = self.inner.write();

        let removed = match inner.rooms_by_conn.get_mut(connection_id) {
            Some(rooms) => rooms.remove(&name),
            None => false,
        };
        if !removed {
            return false;
        }

        let conn_emptied = inner
            .rooms_by_conn
            .get(connection_id)
            .is_some_and(|rooms| rooms.is_empty());
        if conn_emptied {
            inner.rooms_by_conn.remove(connection_id);
        }

        let room_emptied = match inner.conns_by_room.get_mut(&name) {
            Some(members) => {
                members.remove(connection_id);
                members.is_empty()
            }
            None => false,
        };
        if room_emptied {
            inner.conns_by_room.remove(&name);
        }
        true
    }

    /// Remove a connection from every room it joined.
    ///
    /// Idempotent; visits only the connection's own rooms.
    pub fn cleanup(&self, connection_id: &str) {
        let mut inner = self.inner.write();
        let rooms = match inner.rooms_by_conn.remove(connection_id) {
            Some(rooms) => rooms,
            None => return,
        };
        for name in rooms {
            let emptied = match inner.conns_by_room.get_mut(&name) {
                Some(members) => {
                    members.remove(connection_id);
                    members.is_empty()
                }
                None => false,
            };
            if emptied {
                inner.conns_by_room.remove(&name);
            }
        }
    }

    /// True when the connection is a member of the room.
    pub fn is_member(&self, connection_id: &str, room: &Room) -> bool {
        self.inner
            .read()
            .rooms_by_conn
            .get(connection_id)
            .is_some_and(|rooms| rooms.contains(&room.name()))
    }

    /// Canonical names of the rooms a connection joined, sorted.
    pub fn rooms_of(&self, connection_id: &str) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .inner
            .read()
            .rooms_by_conn
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// Connection ids currently in a room.
    pub fn members_of(&self, room: &Room) -> Vec<ConnectionId> {
        self.inner
            .read()
            .conns_by_room
            .get(&room.name())
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of members in a room.
    pub fn member_count(&self, room: &Room) -> usize {
        self.inner
            .read()
            .conns_by_room
            .get(&room.name())
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.inner.read().conns_by_room.len()
    }

    /// Number of connections that joined at least one room.
    pub fn connection_count(&self) -> usize {
        self.inner.read().rooms_by_conn.len()
    }

    /// Every room with at least one member, with its member count, sorted by
    /// room name.
    pub fn rooms_with_counts(&self) -> Vec<(String, usize)> {
        let mut rooms: Vec<(String, usize)> = self
            .inner
            .read()
            .conns_by_room
            .iter()
            .map(|(name, members)| (name.clone(), members.len()))
            .collect();
        rooms.sort();
        rooms
    }
}
