//! Error types for the chat overlay.

use thiserror::Error;

/// Reasons a chat send is rejected.
///
/// Every rejection leaves the overlay untouched: no history entry, no
/// cooldown mark, no event.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Match id was zero or negative.
    #[error("match id must be a positive integer")]
    InvalidMatchId,

    /// Text was empty after trimming.
    #[error("message text is empty")]
    EmptyText,

    /// Sender is not a plausible wallet address.
    #[error("sender must be a 0x-prefixed address")]
    InvalidSender,

    /// Sender connection has not joined the match room.
    #[error("not subscribed to {room}")]
    NotSubscribed {
        /// Canonical name of the room the send targeted.
        room: String,
    },

    /// Connection sent again before its cooldown elapsed.
    #[error("too fast, one message per second")]
    TooFast,
}
