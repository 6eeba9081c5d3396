//! Token-bucket rate limiting for room commands.
//!
//! Each connection gets its own bucket. Tokens refill continuously rather
//! than in window steps, so a client that drains its burst earns the next
//! command back after `1 / refill_per_sec` seconds instead of waiting for a
//! window boundary.

use crate::connection::ConnectionId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Rate limiting configuration.
///
/// Unlisted fields fall back to their defaults when deserialized from a
/// partial config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Burst size: tokens a fresh or fully idle bucket holds.
    pub capacity: f64,
    /// Tokens earned back per second.
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_per_sec: 2.0,
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn try_consume(&mut self, config: &RateLimitConfig, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.refill_per_sec).min(config.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-connection rate limiter for join/leave commands.
#[derive(Debug, Default)]
pub struct RoomEventLimiter {
    buckets: RwLock<HashMap<ConnectionId, TokenBucket>>,
    config: RateLimitConfig,
}

impl RoomEventLimiter {
    /// Create a limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Consume one token for this connection, creating a full bucket on
    /// first sight. Returns false when the command should be rejected.
    pub fn allow(&self, connection_id: &str) -> bool {
        self.allow_at(connection_id, Instant::now())
    }

    /// Like [`allow`](Self::allow) with an explicit clock, for deterministic
    /// tests.
    pub fn allow_at(&self, connection_id: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.write();
        let bucket = buckets
            .entry(connection_id.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.capacity, now));
        bucket.try_consume(&self.config, now)
    }

    /// Forget a connection's bucket. A later [`allow`](Self::allow) starts
    /// from a full burst again.
    pub fn reset(&self, connection_id: &str) {
        self.buckets.write().remove(connection_id);
    }

    /// Number of connections currently holding a bucket.
    pub fn tracked(&self) -> usize {
        self.buckets.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_up_to_capacity() {
        let limiter = RoomEventLimiter::new(RateLimitConfig::default());
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", now));
        }
        assert!(!limiter.allow_at("conn-1", now));
    }

    #[test]
    fn test_refill_earns_tokens_continuously() {
        let limiter = RoomEventLimiter::new(RateLimitConfig::default());
        let start = Instant::now();

        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", start));
        }
        assert!(!limiter.allow_at("conn-1", start));

        // 500ms at 2 tokens/sec earns exactly one command back.
        let later = start + Duration::from_millis(500);
        assert!(limiter.allow_at("conn-1", later));
        assert!(!limiter.allow_at("conn-1", later));
    }

    #[test]
    fn test_tokens_cap_at_capacity() {
        let limiter = RoomEventLimiter::new(RateLimitConfig::default());
        let start = Instant::now();

        assert!(limiter.allow_at("conn-1", start));

        // A long idle stretch refills to the cap, never beyond it.
        let much_later = start + Duration::from_secs(3600);
        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", much_later));
        }
        assert!(!limiter.allow_at("conn-1", much_later));
    }

    #[test]
    fn test_connections_are_isolated() {
        let limiter = RoomEventLimiter::new(RateLimitConfig::default());
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", now));
        }
        assert!(!limiter.allow_at("conn-1", now));

        // Another connection still has its full burst.
        assert!(limiter.allow_at("conn-2", now));
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn test_reset_restores_full_burst() {
        let limiter = RoomEventLimiter::new(RateLimitConfig::default());
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", now));
        }
        assert!(!limiter.allow_at("conn-1", now));

        limiter.reset("conn-1");
        assert_eq!(limiter.tracked(), 0);

        for _ in 0..10 {
            assert!(limiter.allow_at("conn-1", now));
        }
        assert!(!limiter.allow_at("conn-1", now));
    }

    #[test]
    fn test_custom_config() {
        let limiter = RoomEventLimiter::new(RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 1.0,
        });
        let now = Instant::now();

        assert!(limiter.allow_at("conn-1", now));
        assert!(limiter.allow_at("conn-1", now));
        assert!(!limiter.allow_at("conn-1", now));

        let later = now + Duration::from_secs(1);
        assert!(limiter.allow_at("conn-1", later));
        assert!(!limiter.allow_at("conn-1", later));
    }
}
