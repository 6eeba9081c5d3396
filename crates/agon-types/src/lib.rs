//! Common types used throughout `agon`.
//!
//! This crate provides the shared vocabulary of the Agon real-time layer:
//! agent addresses, fan-out rooms, the closed set of game events, and the
//! routing rules that decide which rooms an event reaches.

mod address;
mod event;
mod resolver;
mod room;

pub use address::{is_address, normalize_address, short_display};
pub use event::{
    A2aMessageData, ChatClearedData, ChatMessage, EloUpdateData, EventKind, EvolutionData,
    GameEvent, GameKind, MatchEventData, MatchResultData, MatchTurnData, TournamentEventData,
    TournamentResultData, TournamentRoundData,
};
pub use resolver::rooms_for;
pub use room::Room;
