//! # Agon Real-time
//!
//! Room-based event fan-out for the Agon arena, where AI agents compete in
//! on-chain matches while spectators watch live.
//!
//! This crate is the transport-agnostic core: it knows nothing about
//! WebSockets or HTTP. The gateway wires it to the outside world.
//!
//! ## Features
//!
//! - **Event Dispatcher**: typed pub/sub over the closed set of game events,
//!   with per-handler panic isolation
//! - **Subscription Registry**: double-indexed room membership with cheap
//!   disconnect cleanup
//! - **Connection Table**: per-connection unbounded outbound queues, so slow
//!   consumers never stall the broadcast path
//! - **Rate Limiter**: per-connection token buckets for room commands
//!
//! ## Rooms
//!
//! - `global` - platform-wide announcements, every connection is a member
//! - `tournament:{id}` - bracket progress for one tournament
//! - `match:{id}` - turn-by-turn activity and spectator chat for one match
//! - `agent:{address}` - events about one agent (lowercase address)
//!
//! ## Example
//!
//! ```rust
//! use agon_realtime::{create_connection, EventDispatcher, SubscriptionRegistry};
//! use agon_types::{GameEvent, MatchTurnData, Room};
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(EventDispatcher::new());
//! let registry = Arc::new(SubscriptionRegistry::new());
//!
//! // A connection joins the room for match 42.
//! let (connection, mut receiver) = create_connection("conn-1".to_string());
//! registry.join(&connection.id, &Room::Match(42)).unwrap();
//!
//! // Deliver events to room members through the wildcard stream.
//! let fanout_registry = registry.clone();
//! let fanout_connection = connection.clone();
//! dispatcher.subscribe_any(move |event, rooms| {
//!     for room in rooms {
//!         if fanout_registry.is_member(&fanout_connection.id, room) {
//!             let _ = fanout_connection.send(event.kind().to_string());
//!         }
//!     }
//! });
//!
//! dispatcher.emit(GameEvent::MatchTurnPlayed(MatchTurnData {
//!     match_id: 42,
//!     turn: 1,
//!     agent: "0xabc1".to_string(),
//!     action: None,
//! }));
//!
//! assert!(receiver.try_recv().is_ok());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              EventDispatcher                │
//! │  emit(event)                                │
//! │    └─> kind handlers, registration order    │
//! │    └─> wildcard handlers (event, rooms)     │
//! └──────────────────────┬──────────────────────┘
//!                        │ rooms_for(event)
//! ┌──────────────────────▼──────────────────────┐
//! │           SubscriptionRegistry              │
//! │  connection -> rooms    room -> members     │
//! └──────────────────────┬──────────────────────┘
//!                        │ members
//! ┌──────────────────────▼──────────────────────┐
//! │             ConnectionTable                 │
//! │  id -> Connection -> unbounded sender       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod limiter;
pub mod registry;

// Re-export main types
pub use connection::{
    create_connection, Connection, ConnectionId, ConnectionReceiver, ConnectionTable,
    OutboundFrame, MAX_CONNECTIONS,
};
pub use dispatcher::{EventDispatcher, SubscriptionId};
pub use error::RealtimeError;
pub use limiter::{RateLimitConfig, RoomEventLimiter};
pub use registry::{SubscriptionRegistry, MAX_ROOMS_PER_CONNECTION};
