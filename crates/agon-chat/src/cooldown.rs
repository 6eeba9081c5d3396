//! Per-connection send cooldown.
//!
//! Unlike the token bucket guarding room commands, chat uses a fixed
//! interval: one message per cooldown window, no burst. The mark commits
//! only when the caller accepts the send, so rejected sends never push the
//! next allowed time out.

use agon_realtime::ConnectionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the last accepted send per connection.
#[derive(Debug)]
pub struct ChatCooldown {
    min_interval: Duration,
    last_sent: RwLock<HashMap<ConnectionId, Instant>>,
}

impl ChatCooldown {
    /// Create a cooldown with the given minimum interval between sends.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: RwLock::new(HashMap::new()),
        }
    }

    /// Try to record a send now.
    ///
    /// Returns true and commits the mark when at least the minimum interval
    /// elapsed since the last accepted send (or none was recorded). Returns
    /// false without touching any state otherwise.
    pub fn try_mark(&self, connection_id: &str) -> bool {
        self.try_mark_at(connection_id, Instant::now())
    }

    /// Like [`try_mark`](Self::try_mark) with an explicit clock, for
    /// deterministic tests.
    pub fn try_mark_at(&self, connection_id: &str, now: Instant) -> bool {
        let mut last_sent = self.last_sent.write();
        if let Some(last) = last_sent.get(connection_id) {
            if now.saturating_duration_since(*last) < self.min_interval {
                return false;
            }
        }
        last_sent.insert(connection_id.to_string(), now);
        true
    }

    /// Forget a connection's mark.
    pub fn reset(&self, connection_id: &str) {
        self.last_sent.write().remove(connection_id);
    }

    /// Number of connections with a recorded mark.
    pub fn tracked(&self) -> usize {
        self.last_sent.read().len()
    }
}
