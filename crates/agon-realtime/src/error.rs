//! Error types for the real-time module.

use thiserror::Error;

/// Errors that can occur in real-time operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection table is full.
    #[error("connection limit reached: max {0} connections")]
    AtCapacity(usize),

    /// Per-connection room limit exceeded.
    #[error("room limit exceeded: max {0} rooms per connection")]
    RoomLimit(usize),

    /// Outbound channel closed.
    #[error("connection channel closed")]
    ChannelClosed,
}
