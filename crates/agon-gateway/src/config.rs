//! Gateway configuration types.

use crate::error::{GatewayError, Result};
use agon_chat::ChatConfig;
use agon_realtime::{RateLimitConfig, MAX_CONNECTIONS, MAX_ROOMS_PER_CONNECTION};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

/// Configuration for the Agon gateway.
///
/// Every field has a sensible default, so a config file only needs to
/// name the values it overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP/WebSocket server listens on.
    pub listen_addr: SocketAddr,

    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,

    /// Maximum rooms a single connection may join.
    pub max_rooms_per_connection: usize,

    /// Token bucket guarding join/leave commands.
    pub rate_limit: RateLimitConfig,

    /// Spectator chat settings.
    pub chat: ChatConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8090),
            max_connections: MAX_CONNECTIONS,
            max_rooms_per_connection: MAX_ROOMS_PER_CONNECTION,
            rate_limit: RateLimitConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GatewayError::InvalidConfig(format!("failed to read file: {}", e)))?;

        let config: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_connections must be at least 1".into(),
            ));
        }

        if self.max_rooms_per_connection == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_rooms_per_connection must be at least 1".into(),
            ));
        }

        if self.rate_limit.capacity < 1.0 {
            return Err(GatewayError::InvalidConfig(
                "rate_limit.capacity must allow at least one command".into(),
            ));
        }

        Ok(())
    }
}
