//! Bridge between the event dispatcher and live WebSocket connections.
//!
//! The bridge owns the connection table and the per-connection command
//! handling. A wildcard dispatcher subscription forwards every emitted
//! event to the members of its fan-out rooms, so producers only ever talk
//! to the dispatcher and never see sockets.

use crate::config::GatewayConfig;
use crate::protocol::{epoch_ms, ClientCommand, EventFrame, ServerMessage};
use agon_chat::{ChatError, ChatOverlay};
use agon_realtime::{
    create_connection, Connection, ConnectionId, ConnectionReceiver, ConnectionTable,
    EventDispatcher, RealtimeError, RoomEventLimiter, SubscriptionRegistry,
};
use agon_types::{EventKind, GameEvent, Room};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Connects the dispatcher's event stream to spectator WebSockets.
pub struct RealtimeBridge {
    connections: ConnectionTable,
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Arc<EventDispatcher>,
    chat: Arc<ChatOverlay>,
    limiter: RoomEventLimiter,
    total_connections: AtomicU64,
    events_broadcast: AtomicU64,
    wired: AtomicBool,
}

impl RealtimeBridge {
    /// Create a bridge over shared registry, dispatcher, and chat state.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        dispatcher: Arc<EventDispatcher>,
        chat: Arc<ChatOverlay>,
        config: &GatewayConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            connections: ConnectionTable::with_limit(config.max_connections),
            registry,
            dispatcher,
            chat,
            limiter: RoomEventLimiter::new(config.rate_limit.clone()),
            total_connections: AtomicU64::new(0),
            events_broadcast: AtomicU64::new(0),
            wired: AtomicBool::new(false),
        })
    }

    /// Attach the bridge to the dispatcher.
    ///
    /// Registers a wildcard subscription that forwards every event to the
    /// members of its rooms, plus a match completion hook that drops that
    /// match's chat history. Calling this more than once is a no-op.
    pub fn wire(self: &Arc<Self>) {
        if self.wired.swap(true, Ordering::SeqCst) {
            return;
        }

        let bridge = Arc::downgrade(self);
        self.dispatcher.subscribe_any(move |event, rooms| {
            if let Some(bridge) = bridge.upgrade() {
                bridge.broadcast(event, rooms);
            }
        });

        let chat = Arc::downgrade(&self.chat);
        self.dispatcher
            .subscribe(EventKind::MatchCompleted, move |event| {
                if let GameEvent::MatchCompleted(data) = event {
                    if let Some(chat) = chat.upgrade() {
                        chat.clear_history(data.match_id);
                    }
                }
            });
    }

    /// Accept a new spectator connection.
    ///
    /// The connection is placed in the global room and greeted with a
    /// `connected` frame. Returns the receiver its socket task drains.
    pub fn register_connection(
        &self,
    ) -> Result<(Arc<Connection>, ConnectionReceiver), RealtimeError> {
        let id = uuid::Uuid::new_v4().to_string();
        let (connection, receiver) = create_connection(id);
        self.connections.insert(connection.clone())?;
        self.total_connections.fetch_add(1, Ordering::Relaxed);

        // Every spectator starts in the global room.
        let _ = self.registry.join(&connection.id, &Room::Global);

        let welcome = ServerMessage::Connected {
            connection_id: connection.id.clone(),
            rooms: self.registry.rooms_of(&connection.id),
        };
        if let Ok(json) = serde_json::to_string(&welcome) {
            let _ = connection.send(json);
        }

        info!(connection_id = %connection.id, "spectator connected");
        Ok((connection, receiver))
    }

    /// Handle one parsed client command.
    ///
    /// Returns the reply frame to queue, or `None` when the command has no
    /// direct reply (an accepted chat send answers through the fan-out).
    pub fn handle_command(
        &self,
        connection: &Arc<Connection>,
        command: ClientCommand,
    ) -> Option<ServerMessage> {
        connection.touch();

        match command {
            ClientCommand::JoinTournament { id } => self.join(connection, Room::Tournament(id)),
            ClientCommand::LeaveTournament { id } => self.leave(connection, Room::Tournament(id)),
            ClientCommand::JoinMatch { id } => self.join(connection, Room::Match(id)),
            ClientCommand::LeaveMatch { id } => self.leave(connection, Room::Match(id)),
            ClientCommand::JoinAgent { address } => self.join(connection, Room::agent(address)),
            ClientCommand::LeaveAgent { address } => self.leave(connection, Room::agent(address)),
            ClientCommand::Ping => Some(ServerMessage::Pong {
                server_time_ms: epoch_ms(),
            }),
            ClientCommand::ChatSend {
                match_id,
                text,
                sender,
            } => match self.chat.send(&connection.id, match_id, &text, &sender) {
                Ok(_) => None,
                Err(e) => Some(ServerMessage::ChatError {
                    message: e.to_string(),
                }),
            },
            ClientCommand::ChatHistory { match_id } => {
                if match_id < 1 {
                    return Some(ServerMessage::ChatError {
                        message: ChatError::InvalidMatchId.to_string(),
                    });
                }
                Some(ServerMessage::ChatHistory {
                    match_id: match_id as u64,
                    messages: self.chat.history(match_id as u64),
                })
            }
        }
    }

    fn join(&self, connection: &Arc<Connection>, room: Room) -> Option<ServerMessage> {
        if !self.limiter.allow(&connection.id) {
            debug!(connection_id = %connection.id, room = %room, "room command rate limited");
            return Some(ServerMessage::Error {
                message: "too many room commands".to_string(),
            });
        }

        match self.registry.join(&connection.id, &room) {
            Ok(true) => debug!(connection_id = %connection.id, room = %room, "joined room"),
            Ok(false) => {}
            Err(e) => {
                return Some(ServerMessage::Error {
                    message: e.to_string(),
                })
            }
        }
        Some(ServerMessage::Subscriptions {
            rooms: self.registry.rooms_of(&connection.id),
        })
    }

    fn leave(&self, connection: &Arc<Connection>, room: Room) -> Option<ServerMessage> {
        if !self.limiter.allow(&connection.id) {
            debug!(connection_id = %connection.id, room = %room, "room command rate limited");
            return Some(ServerMessage::Error {
                message: "too many room commands".to_string(),
            });
        }

        if self.registry.leave(&connection.id, &room) {
            debug!(connection_id = %connection.id, room = %room, "left room");
        }
        Some(ServerMessage::Subscriptions {
            rooms: self.registry.rooms_of(&connection.id),
        })
    }

    /// Deliver an event to every member of the given rooms.
    ///
    /// The frame is serialized once. A connection in several of the rooms
    /// receives it exactly once.
    pub fn broadcast(&self, event: &GameEvent, rooms: &[Room]) {
        if rooms.is_empty() {
            return;
        }

        let frame = EventFrame::new(event.clone(), rooms);
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                error!(event = %event.kind(), error = %e, "failed to serialize event frame");
                return;
            }
        };

        let mut seen = HashSet::new();
        let mut delivered = 0usize;
        for room in rooms {
            for member in self.registry.members_of(room) {
                if !seen.insert(member.clone()) {
                    continue;
                }
                if let Some(connection) = self.connections.get(&member) {
                    if connection.send(json.clone()).is_ok() {
                        delivered += 1;
                    }
                }
            }
        }

        self.events_broadcast.fetch_add(1, Ordering::Relaxed);
        debug!(event = %event.kind(), rooms = rooms.len(), delivered, "event broadcast");
    }

    /// Remove a connection and all of its room, limiter, and chat state.
    ///
    /// Idempotent; safe to call from both the socket task and shutdown.
    pub fn on_disconnect(&self, connection_id: &str) {
        let existed = self.connections.remove(connection_id).is_some();
        self.registry.cleanup(connection_id);
        self.limiter.reset(connection_id);
        self.chat.reset_connection(connection_id);
        if existed {
            info!(connection_id = %connection_id, "spectator disconnected");
        }
    }

    /// Signal close to every live connection and drop their state.
    ///
    /// Failures are collected rather than aborting the sweep, so one dead
    /// socket cannot keep the rest from closing.
    pub fn disconnect_all(&self) -> ShutdownReport {
        let ids = self.connections.ids();
        let mut failures = Vec::new();

        for id in &ids {
            if let Some(connection) = self.connections.get(id) {
                if let Err(e) = connection.close() {
                    failures.push((id.clone(), e));
                }
            }
            self.on_disconnect(id);
        }

        ShutdownReport {
            closed: ids.len() - failures.len(),
            failures,
        }
    }

    /// Snapshot of gateway counters.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            current_connections: self.connections.len(),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            total_events: self.events_broadcast.load(Ordering::Relaxed),
            total_chat_messages: self.chat.messages_sent(),
            active_rooms: self.registry.room_count(),
        }
    }

    /// Current number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The dispatcher events flow through.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Room membership registry.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Spectator chat overlay.
    pub fn chat(&self) -> &Arc<ChatOverlay> {
        &self.chat
    }
}

/// Bridge statistics.
#[derive(Debug, Clone, Default)]
pub struct BridgeStats {
    /// Current number of connections.
    pub current_connections: usize,
    /// Total connections since start.
    pub total_connections: u64,
    /// Total events broadcast since start.
    pub total_events: u64,
    /// Total chat messages accepted since start.
    pub total_chat_messages: u64,
    /// Rooms with at least one member.
    pub active_rooms: usize,
}

/// Outcome of draining all connections at shutdown.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Connections that received a close signal.
    pub closed: usize,
    /// Connections whose close signal could not be delivered.
    pub failures: Vec<(ConnectionId, RealtimeError)>,
}

impl ShutdownReport {
    /// True when every connection closed cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_chat::ChatConfig;
    use agon_realtime::{OutboundFrame, RateLimitConfig};
    use agon_types::{EloUpdateData, GameKind, MatchResultData, MatchTurnData};

    const SENDER: &str = "0x00112233445566778899aabbccddeeff00112233";

    fn bridge_with_config(config: GatewayConfig) -> Arc<RealtimeBridge> {
        let registry = Arc::new(SubscriptionRegistry::with_room_limit(
            config.max_rooms_per_connection,
        ));
        let dispatcher = Arc::new(EventDispatcher::new());
        let chat = Arc::new(ChatOverlay::with_config(
            registry.clone(),
            dispatcher.clone(),
            config.chat.clone(),
        ));
        let bridge = RealtimeBridge::new(registry, dispatcher, chat, &config);
        bridge.wire();
        bridge
    }

    fn test_bridge() -> Arc<RealtimeBridge> {
        bridge_with_config(GatewayConfig::default())
    }

    fn next_message(rx: &mut ConnectionReceiver) -> serde_json::Value {
        match rx.try_recv().unwrap() {
            OutboundFrame::Message(json) => serde_json::from_str(&json).unwrap(),
            OutboundFrame::Close => panic!("unexpected close frame"),
        }
    }

    fn turn_event(match_id: u64) -> GameEvent {
        GameEvent::MatchTurnPlayed(MatchTurnData {
            match_id,
            turn: 1,
            agent: SENDER.to_string(),
            action: None,
        })
    }

    #[test]
    fn test_register_sends_welcome() {
        let bridge = test_bridge();
        let (connection, mut rx) = bridge.register_connection().unwrap();

        let welcome = next_message(&mut rx);
        assert_eq!(welcome["type"], "connected");
        assert_eq!(welcome["connectionId"], connection.id.as_str());
        assert_eq!(welcome["rooms"][0], "global");

        assert_eq!(bridge.connection_count(), 1);
        assert_eq!(bridge.stats().total_connections, 1);
    }

    #[test]
    fn test_register_rejects_at_capacity() {
        let bridge = bridge_with_config(GatewayConfig {
            max_connections: 1,
            ..Default::default()
        });

        let (_conn, _rx) = bridge.register_connection().unwrap();
        assert!(matches!(
            bridge.register_connection(),
            Err(RealtimeError::AtCapacity(1))
        ));
        assert_eq!(bridge.connection_count(), 1);
    }

    #[test]
    fn test_join_command_returns_subscriptions() {
        let bridge = test_bridge();
        let (connection, mut rx) = bridge.register_connection().unwrap();
        next_message(&mut rx);

        let reply = bridge
            .handle_command(&connection, ClientCommand::JoinMatch { id: 5 })
            .unwrap();
        match reply {
            ServerMessage::Subscriptions { rooms } => {
                assert_eq!(rooms, vec!["global".to_string(), "match:5".to_string()]);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_ping_returns_pong() {
        let bridge = test_bridge();
        let (connection, _rx) = bridge.register_connection().unwrap();

        let reply = bridge
            .handle_command(&connection, ClientCommand::Ping)
            .unwrap();
        assert!(matches!(reply, ServerMessage::Pong { server_time_ms } if server_time_ms > 0));
    }

    #[test]
    fn test_broadcast_reaches_room_members_only() {
        let bridge = test_bridge();
        let (member, mut member_rx) = bridge.register_connection().unwrap();
        let (_other, mut other_rx) = bridge.register_connection().unwrap();
        next_message(&mut member_rx);
        next_message(&mut other_rx);

        bridge.handle_command(&member, ClientCommand::JoinMatch { id: 5 });
        bridge.dispatcher().emit(turn_event(5));

        let frame = next_message(&mut member_rx);
        assert_eq!(frame["type"], "event");
        assert_eq!(frame["event"], "match:turnPlayed");
        assert_eq!(frame["rooms"][0], "match:5");

        assert!(other_rx.try_recv().is_err());
        assert_eq!(bridge.stats().total_events, 1);
    }

    #[test]
    fn test_broadcast_deduplicates_across_rooms() {
        let bridge = test_bridge();
        let (connection, mut rx) = bridge.register_connection().unwrap();
        next_message(&mut rx);

        // Member of both fan-out rooms of an elo update: global and the
        // agent's own room.
        bridge.handle_command(
            &connection,
            ClientCommand::JoinAgent {
                address: "0xAA".to_string(),
            },
        );

        bridge.dispatcher().emit(GameEvent::AgentEloUpdated(EloUpdateData {
            address: "0xAA".to_string(),
            old_elo: 1200.0,
            new_elo: 1215.5,
            match_id: Some(5),
        }));

        let frame = next_message(&mut rx);
        assert_eq!(frame["event"], "agent:eloUpdated");
        // No duplicate delivery for the second room.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_match_completion_clears_chat() {
        let bridge = test_bridge();
        let (connection, mut rx) = bridge.register_connection().unwrap();
        next_message(&mut rx);

        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 5 });
        bridge
            .chat()
            .send(&connection.id, 5, "good luck", SENDER)
            .unwrap();
        assert_eq!(bridge.chat().history_len(5), 1);

        bridge.dispatcher().emit(GameEvent::MatchCompleted(MatchResultData {
            match_id: 5,
            game: GameKind::QuizBowl,
            tournament_id: None,
            agents: vec![],
            winner: Some(SENDER.to_string()),
        }));

        assert_eq!(bridge.chat().history_len(5), 0);

        // The member sees the chat message, then the clear, then the result.
        let chat = next_message(&mut rx);
        assert_eq!(chat["event"], "chat:message");
        let cleared = next_message(&mut rx);
        assert_eq!(cleared["event"], "chat:cleared");
        assert_eq!(cleared["data"]["matchId"], 5);
        let completed = next_message(&mut rx);
        assert_eq!(completed["event"], "match:completed");
    }

    #[test]
    fn test_chat_send_command_fans_out() {
        let bridge = test_bridge();
        let (alice, mut alice_rx) = bridge.register_connection().unwrap();
        let (bob, mut bob_rx) = bridge.register_connection().unwrap();
        next_message(&mut alice_rx);
        next_message(&mut bob_rx);

        bridge.handle_command(&alice, ClientCommand::JoinMatch { id: 3 });
        bridge.handle_command(&bob, ClientCommand::JoinMatch { id: 3 });

        let reply = bridge.handle_command(
            &alice,
            ClientCommand::ChatSend {
                match_id: 3,
                text: "nice move".to_string(),
                sender: SENDER.to_string(),
            },
        );
        assert!(reply.is_none());

        for rx in [&mut alice_rx, &mut bob_rx] {
            let frame = next_message(rx);
            assert_eq!(frame["event"], "chat:message");
            assert_eq!(frame["data"]["text"], "nice move");
        }
        assert_eq!(bridge.chat().history_len(3), 1);
    }

    #[test]
    fn test_chat_send_rejection_replies_chat_error() {
        let bridge = test_bridge();
        let (connection, _rx) = bridge.register_connection().unwrap();

        // Not a member of match:9.
        let reply = bridge
            .handle_command(
                &connection,
                ClientCommand::ChatSend {
                    match_id: 9,
                    text: "hello".to_string(),
                    sender: SENDER.to_string(),
                },
            )
            .unwrap();
        match reply {
            ServerMessage::ChatError { message } => {
                assert!(message.contains("not subscribed"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
        assert_eq!(bridge.chat().history_len(9), 0);
    }

    #[test]
    fn test_chat_history_command() {
        let bridge = test_bridge();
        let (connection, _rx) = bridge.register_connection().unwrap();
        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 3 });
        bridge
            .chat()
            .send(&connection.id, 3, "first", SENDER)
            .unwrap();

        let reply = bridge
            .handle_command(&connection, ClientCommand::ChatHistory { match_id: 3 })
            .unwrap();
        match reply {
            ServerMessage::ChatHistory { match_id, messages } => {
                assert_eq!(match_id, 3);
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].text, "first");
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        let invalid = bridge
            .handle_command(&connection, ClientCommand::ChatHistory { match_id: 0 })
            .unwrap();
        assert!(matches!(invalid, ServerMessage::ChatError { .. }));
    }

    #[test]
    fn test_room_commands_rate_limited() {
        let config = GatewayConfig {
            rate_limit: RateLimitConfig {
                capacity: 2.0,
                refill_per_sec: 0.001,
            },
            ..Default::default()
        };
        let bridge = bridge_with_config(config);
        let (connection, _rx) = bridge.register_connection().unwrap();

        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 1 });
        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 2 });
        let reply = bridge
            .handle_command(&connection, ClientCommand::JoinMatch { id: 3 })
            .unwrap();
        match reply {
            ServerMessage::Error { message } => assert!(message.contains("too many")),
            other => panic!("unexpected reply: {:?}", other),
        }

        // The throttled join must not have touched the registry.
        let rooms = bridge.registry().rooms_of(&connection.id);
        assert_eq!(rooms.len(), 3);
        assert!(!rooms.contains(&"match:3".to_string()));
    }

    #[test]
    fn test_chat_send_is_not_rate_limited_by_room_bucket() {
        let config = GatewayConfig {
            rate_limit: RateLimitConfig {
                capacity: 1.0,
                refill_per_sec: 0.001,
            },
            chat: ChatConfig {
                cooldown_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let bridge = bridge_with_config(config);
        let (connection, _rx) = bridge.register_connection().unwrap();

        // Drains the room bucket.
        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 1 });

        // Chat still goes through; it has its own cooldown.
        let reply = bridge.handle_command(
            &connection,
            ClientCommand::ChatSend {
                match_id: 1,
                text: "still here".to_string(),
                sender: SENDER.to_string(),
            },
        );
        assert!(reply.is_none());
    }

    #[test]
    fn test_disconnect_cleans_state() {
        let bridge = test_bridge();
        let (connection, _rx) = bridge.register_connection().unwrap();
        bridge.handle_command(&connection, ClientCommand::JoinMatch { id: 5 });
        bridge
            .chat()
            .send(&connection.id, 5, "bye", SENDER)
            .unwrap();

        bridge.on_disconnect(&connection.id);

        assert_eq!(bridge.connection_count(), 0);
        assert!(bridge.registry().rooms_of(&connection.id).is_empty());
        assert_eq!(bridge.registry().member_count(&Room::Match(5)), 0);
        assert_eq!(bridge.chat().tracked_cooldowns(), 0);

        // A second disconnect is a no-op.
        bridge.on_disconnect(&connection.id);
        assert_eq!(bridge.connection_count(), 0);
    }

    #[test]
    fn test_disconnect_all_reports_failures() {
        let bridge = test_bridge();
        let (_a, mut a_rx) = bridge.register_connection().unwrap();
        let (_b, mut b_rx) = bridge.register_connection().unwrap();
        let (_dead, dead_rx) = bridge.register_connection().unwrap();
        drop(dead_rx);

        let report = bridge.disconnect_all();
        assert_eq!(report.closed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(bridge.connection_count(), 0);

        // Live receivers see the close frame after the welcome.
        for rx in [&mut a_rx, &mut b_rx] {
            next_message(rx);
            assert_eq!(rx.try_recv().unwrap(), OutboundFrame::Close);
        }

        // Events emitted after the sweep reach nobody, not even ex-members
        // of the global room.
        bridge.dispatcher().emit(GameEvent::AgentEloUpdated(EloUpdateData {
            address: SENDER.to_string(),
            old_elo: 1200.0,
            new_elo: 1210.0,
            match_id: None,
        }));
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_err());
    }

    #[test]
    fn test_wire_is_idempotent() {
        let bridge = test_bridge();
        bridge.wire();
        bridge.wire();
        assert_eq!(bridge.dispatcher().wildcard_count(), 1);
    }
}
