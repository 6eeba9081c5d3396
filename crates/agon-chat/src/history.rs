//! Bounded per-match message history.

use agon_types::ChatMessage;
use std::collections::VecDeque;

/// A ring of the most recent messages for one match, oldest first.
#[derive(Debug)]
pub(crate) struct RoomHistory {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl RoomHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest when full.
    pub(crate) fn push(&mut self, message: ChatMessage) {
        if self.capacity == 0 {
            return;
        }
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub(crate) fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
fn sample_message(n: u64) -> ChatMessage {
    ChatMessage {
        id: format!("m-{}", n),
        match_id: 1,
        match_room: "match:1".to_string(),
        sender: "0xaa".to_string(),
        sender_display: "0xaa".to_string(),
        text: format!("message {}", n),
        sent_at: n,
    }
}
