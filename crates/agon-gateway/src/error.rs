//! Gateway error types.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors that can occur while configuring or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The listener could not bind to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the gateway tried to listen on.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration is missing, unreadable, or malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
