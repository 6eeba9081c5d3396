//! # Agon Gateway
//!
//! HTTP/WebSocket gateway that fans on-chain game events out to
//! spectators in real time.
//!
//! The gateway sits between the platform's event producers (chain
//! indexer, match engine, evolution jobs) and spectator WebSockets.
//! Producers emit typed [`agon_types::GameEvent`]s into the
//! [`agon_realtime::EventDispatcher`]; the gateway resolves each event
//! to its fan-out rooms and delivers one frame per subscribed
//! connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Agon Gateway                         │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │                   HTTP API Layer                    │   │
//! │  │  • /ws WebSocket endpoint                           │   │
//! │  │  • /api/events ingest for trusted producers         │   │
//! │  │  • /api/realtime/* introspection                    │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                            │                               │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │                  Realtime Bridge                    │   │
//! │  │  • Connection table and per-socket queues           │   │
//! │  │  • Command handling (join/leave/chat/ping)          │   │
//! │  │  • Room fan-out with cross-room dedup               │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                            │                               │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │             Dispatcher / Registry / Chat            │   │
//! │  │  • agon-realtime: dispatcher, rooms, rate limits    │   │
//! │  │  • agon-chat: per-match spectator chat              │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                                                            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin agon-gateway -- --listen-addr 127.0.0.1:8090
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP router, health check, and event ingest
//! - [`ws`] - WebSocket endpoint and realtime introspection routes
//! - [`bridge`] - Glue between the dispatcher and live connections
//! - [`protocol`] - JSON wire protocol (commands, replies, event frames)
//! - [`server`] - Listener lifecycle and graceful shutdown
//! - [`config`] - Gateway configuration management
//! - [`logging`] - Structured logging initialization
//! - [`error`] - Gateway error types
//!
//! ## Example: wiring a bridge
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agon_chat::ChatOverlay;
//! use agon_gateway::api::AppState;
//! use agon_gateway::bridge::RealtimeBridge;
//! use agon_gateway::config::GatewayConfig;
//! use agon_realtime::{EventDispatcher, SubscriptionRegistry};
//!
//! let config = GatewayConfig::default();
//! let registry = Arc::new(SubscriptionRegistry::with_room_limit(
//!     config.max_rooms_per_connection,
//! ));
//! let dispatcher = Arc::new(EventDispatcher::new());
//! let chat = Arc::new(ChatOverlay::with_config(
//!     registry.clone(),
//!     dispatcher.clone(),
//!     config.chat.clone(),
//! ));
//! let bridge = RealtimeBridge::new(registry, dispatcher, chat, &config);
//! bridge.wire();
//!
//! let state = AppState { bridge };
//! ```

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod ws;
