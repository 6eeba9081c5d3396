//! Spectator chat for live matches.
//!
//! Chat rides on the same fan-out core as game events: an accepted message
//! becomes a `chat:message` event and reaches exactly the members of the
//! match room. The overlay owns validation, per-match history and the send
//! cooldown.

use crate::cooldown::ChatCooldown;
use crate::error::ChatError;
use crate::history::RoomHistory;
use agon_realtime::{EventDispatcher, SubscriptionRegistry};
use agon_types::{is_address, short_display, ChatClearedData, ChatMessage, GameEvent, Room};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Chat overlay configuration.
///
/// Unlisted fields fall back to their defaults when deserialized from a
/// partial config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Minimum milliseconds between accepted sends per connection.
    pub cooldown_ms: u64,
    /// Messages retained per match.
    pub history_capacity: usize,
    /// Maximum message length in characters; longer texts are truncated.
    pub max_text_len: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            history_capacity: 100,
            max_text_len: 200,
        }
    }
}

/// Per-match spectator chat.
///
/// Sends are validated in a fixed order: match id, text, sender address,
/// room membership, cooldown. The first failure rejects the send and leaves
/// every piece of state untouched. The cooldown check runs last, so only
/// accepted sends commit a cooldown mark.
pub struct ChatOverlay {
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Arc<EventDispatcher>,
    cooldown: ChatCooldown,
    histories: RwLock<HashMap<u64, RoomHistory>>,
    config: ChatConfig,
    messages_sent: AtomicU64,
}

impl ChatOverlay {
    /// Create an overlay with the default configuration.
    pub fn new(registry: Arc<SubscriptionRegistry>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self::with_config(registry, dispatcher, ChatConfig::default())
    }

    /// Create an overlay with a custom configuration.
    pub fn with_config(
        registry: Arc<SubscriptionRegistry>,
        dispatcher: Arc<EventDispatcher>,
        config: ChatConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            cooldown: ChatCooldown::new(Duration::from_millis(config.cooldown_ms)),
            histories: RwLock::new(HashMap::new()),
            config,
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Validate and deliver one chat message.
    ///
    /// On success the message is appended to the match history and emitted
    /// as a `chat:message` event, and the accepted message is returned.
    pub fn send(
        &self,
        connection_id: &str,
        match_id: i64,
        text: &str,
        sender: &str,
    ) -> Result<ChatMessage, ChatError> {
        if match_id < 1 {
            return Err(ChatError::InvalidMatchId);
        }
        let match_id = match_id as u64;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyText);
        }
        let text: String = trimmed.chars().take(self.config.max_text_len).collect();

        if !is_address(sender) {
            return Err(ChatError::InvalidSender);
        }

        let room = Room::Match(match_id);
        if !self.registry.is_member(connection_id, &room) {
            return Err(ChatError::NotSubscribed { room: room.name() });
        }

        // Last check: the mark commits only on an otherwise accepted send.
        if !self.cooldown.try_mark(connection_id) {
            return Err(ChatError::TooFast);
        }

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            match_id,
            match_room: room.name(),
            sender: sender.to_string(),
            sender_display: short_display(sender),
            text,
            sent_at: epoch_ms(),
        };

        {
            let mut histories = self.histories.write();
            histories
                .entry(match_id)
                .or_insert_with(|| RoomHistory::new(self.config.history_capacity))
                .push(message.clone());
        }
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        debug!(
            match_id,
            sender = %message.sender_display,
            "chat message accepted"
        );

        self.dispatcher.emit(GameEvent::ChatMessage(message.clone()));
        Ok(message)
    }

    /// Retained messages for a match, oldest first.
    pub fn history(&self, match_id: u64) -> Vec<ChatMessage> {
        self.histories
            .read()
            .get(&match_id)
            .map(|history| history.to_vec())
            .unwrap_or_default()
    }

    /// Number of retained messages for a match.
    pub fn history_len(&self, match_id: u64) -> usize {
        self.histories
            .read()
            .get(&match_id)
            .map(|history| history.len())
            .unwrap_or(0)
    }

    /// Drop a match's history and emit `chat:cleared` to its room.
    ///
    /// Called when a match concludes. The event fires even when no message
    /// was ever retained, so spectator UIs can always drop local caches.
    pub fn clear_history(&self, match_id: u64) {
        let removed = self.histories.write().remove(&match_id).is_some();
        if removed {
            debug!(match_id, "chat history cleared");
        }
        self.dispatcher
            .emit(GameEvent::ChatCleared(ChatClearedData { match_id }));
    }

    /// Forget a disconnecting connection's cooldown state.
    pub fn reset_connection(&self, connection_id: &str) {
        self.cooldown.reset(connection_id);
    }

    /// Total messages accepted since startup.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Number of connections with a live cooldown mark.
    pub fn tracked_cooldowns(&self) -> usize {
        self.cooldown.tracked()
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_types::EventKind;
    use std::sync::atomic::AtomicUsize;

    const SENDER: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn overlay_with(config: ChatConfig) -> ChatOverlay {
        let registry = Arc::new(SubscriptionRegistry::new());
        let dispatcher = Arc::new(EventDispatcher::new());
        ChatOverlay::with_config(registry, dispatcher, config)
    }

    fn overlay() -> ChatOverlay {
        overlay_with(ChatConfig::default())
    }

    fn join(overlay: &ChatOverlay, connection_id: &str, match_id: u64) {
        overlay
            .registry
            .join(connection_id, &Room::Match(match_id))
            .unwrap();
    }

    #[test]
    fn test_send_accepted() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        let message = overlay.send("conn-1", 5, "  good luck!  ", SENDER).unwrap();

        assert_eq!(message.match_id, 5);
        assert_eq!(message.match_room, "match:5");
        assert_eq!(message.text, "good luck!");
        assert_eq!(message.sender, SENDER);
        assert_eq!(message.sender_display, "0x1234...5678");
        assert!(!message.id.is_empty());
        assert_eq!(overlay.history_len(5), 1);
        assert_eq!(overlay.messages_sent(), 1);
    }

    #[test]
    fn test_send_emits_chat_event() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        let events = Arc::new(AtomicUsize::new(0));
        let events_in_handler = events.clone();
        overlay
            .dispatcher
            .subscribe(EventKind::ChatMessage, move |event| {
                if let GameEvent::ChatMessage(message) = event {
                    assert_eq!(message.match_room, "match:5");
                }
                events_in_handler.fetch_add(1, Ordering::SeqCst);
            });

        overlay.send("conn-1", 5, "hello", SENDER).unwrap();
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_bad_match_id() {
        let overlay = overlay();

        assert!(matches!(
            overlay.send("conn-1", 0, "hi", SENDER),
            Err(ChatError::InvalidMatchId)
        ));
        assert!(matches!(
            overlay.send("conn-1", -3, "hi", SENDER),
            Err(ChatError::InvalidMatchId)
        ));
    }

    #[test]
    fn test_rejects_empty_text() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        assert!(matches!(
            overlay.send("conn-1", 5, "", SENDER),
            Err(ChatError::EmptyText)
        ));
        assert!(matches!(
            overlay.send("conn-1", 5, "   \t  ", SENDER),
            Err(ChatError::EmptyText)
        ));
        assert_eq!(overlay.history_len(5), 0);
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        assert!(matches!(
            overlay.send("conn-1", 5, "hi", "not-an-address"),
            Err(ChatError::InvalidSender)
        ));
        assert!(matches!(
            overlay.send("conn-1", 5, "hi", "0x"),
            Err(ChatError::InvalidSender)
        ));
    }

    #[test]
    fn test_rejects_non_member() {
        let overlay = overlay();

        let err = overlay.send("conn-1", 7, "hi", SENDER).unwrap_err();
        match err {
            ChatError::NotSubscribed { room } => assert_eq!(room, "match:7"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(overlay.history_len(7), 0);
    }

    #[test]
    fn test_rejects_after_leaving_room() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);
        overlay.registry.leave("conn-1", &Room::Match(5));

        assert!(matches!(
            overlay.send("conn-1", 5, "hi", SENDER),
            Err(ChatError::NotSubscribed { .. })
        ));
        assert_eq!(overlay.history_len(5), 0);
    }

    #[test]
    fn test_second_immediate_send_hits_cooldown() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        overlay.send("conn-1", 5, "first", SENDER).unwrap();
        assert!(matches!(
            overlay.send("conn-1", 5, "second", SENDER),
            Err(ChatError::TooFast)
        ));
        // The rejected send left no trace.
        assert_eq!(overlay.history_len(5), 1);
        assert_eq!(overlay.messages_sent(), 1);
    }

    #[test]
    fn test_rejection_does_not_commit_cooldown() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        // A rejected send must not start the cooldown window.
        assert!(overlay.send("conn-1", 5, "   ", SENDER).is_err());
        assert!(overlay.send("conn-1", 5, "hello", SENDER).is_ok());
    }

    #[test]
    fn test_cooldowns_are_per_connection() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);
        join(&overlay, "conn-2", 5);

        overlay.send("conn-1", 5, "one", SENDER).unwrap();
        overlay.send("conn-2", 5, "two", SENDER).unwrap();
        assert_eq!(overlay.history_len(5), 2);
    }

    #[test]
    fn test_text_truncated_to_char_limit() {
        let overlay = overlay_with(ChatConfig {
            cooldown_ms: 0,
            ..ChatConfig::default()
        });
        join(&overlay, "conn-1", 5);

        let long = "x".repeat(250);
        let message = overlay.send("conn-1", 5, &long, SENDER).unwrap();
        assert_eq!(message.text.chars().count(), 200);

        // Truncation counts characters, not bytes.
        let long_multibyte = "é".repeat(250);
        let message = overlay.send("conn-1", 5, &long_multibyte, SENDER).unwrap();
        assert_eq!(message.text.chars().count(), 200);
    }

    #[test]
    fn test_history_capacity_evicts_oldest() {
        let overlay = overlay_with(ChatConfig {
            cooldown_ms: 0,
            history_capacity: 3,
            ..ChatConfig::default()
        });
        join(&overlay, "conn-1", 5);

        for n in 0..5 {
            overlay.send("conn-1", 5, &format!("message {}", n), SENDER).unwrap();
        }

        let texts: Vec<String> = overlay.history(5).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn test_histories_are_per_match() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);
        join(&overlay, "conn-2", 6);

        overlay.send("conn-1", 5, "in five", SENDER).unwrap();
        overlay.send("conn-2", 6, "in six", SENDER).unwrap();

        assert_eq!(overlay.history_len(5), 1);
        assert_eq!(overlay.history_len(6), 1);
        assert!(overlay.history(7).is_empty());
    }

    #[test]
    fn test_clear_history_drops_and_emits() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);
        overlay.send("conn-1", 5, "hello", SENDER).unwrap();

        let cleared = Arc::new(AtomicUsize::new(0));
        let cleared_in_handler = cleared.clone();
        overlay
            .dispatcher
            .subscribe(EventKind::ChatCleared, move |event| {
                if let GameEvent::ChatCleared(data) = event {
                    assert_eq!(data.match_id, 5);
                }
                cleared_in_handler.fetch_add(1, Ordering::SeqCst);
            });

        overlay.clear_history(5);
        assert_eq!(overlay.history_len(5), 0);
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_connection_clears_cooldown() {
        let overlay = overlay();
        join(&overlay, "conn-1", 5);

        overlay.send("conn-1", 5, "first", SENDER).unwrap();
        overlay.reset_connection("conn-1");
        assert!(overlay.send("conn-1", 5, "second", SENDER).is_ok());
    }
}
