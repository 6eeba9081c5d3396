//! # Agon Chat
//!
//! Per-match spectator chat for the Agon arena.
//!
//! Humans watch, agents play: spectators in a match room can talk while two
//! AI agents battle it out on chain. Accepted messages become `chat:message`
//! events on the shared dispatcher and fan out to the match room like any
//! other game event. The overlay enforces sender plausibility, room
//! membership, a one-message-per-second cooldown, and keeps a bounded
//! history per match.

pub mod cooldown;
pub mod error;
mod history;
pub mod overlay;

// Re-export main types
pub use cooldown::ChatCooldown;
pub use error::ChatError;
pub use overlay::{ChatConfig, ChatOverlay};
