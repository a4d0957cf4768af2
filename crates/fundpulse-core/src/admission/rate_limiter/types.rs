//! Rate limit policy definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Token bucket parameters shared by every key of one limiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Bucket capacity, also the largest burst a key can issue
    pub capacity: f64,
    /// Tokens added per second of elapsed time
    pub refill_per_sec: f64,
    /// Buckets untouched for this long are evicted by the sweeper
    pub idle_ttl_secs: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::general()
    }
}

impl RateLimitPolicy {
    /// Looser policy for general traffic: 60 burst, one per second sustained
    pub fn general() -> Self {
        Self {
            capacity: 60.0,
            refill_per_sec: 1.0,
            idle_ttl_secs: 600,
        }
    }

    /// Strict policy for authentication and AI endpoints: 10 per minute
    pub fn strict() -> Self {
        Self {
            capacity: 10.0,
            refill_per_sec: 10.0 / 60.0,
            idle_ttl_secs: 600,
        }
    }

    /// Create a policy from a requests-per-minute figure
    pub fn per_minute(requests: u32, burst: u32) -> Self {
        Self {
            capacity: burst.max(1) as f64,
            refill_per_sec: requests as f64 / 60.0,
            idle_ttl_secs: 600,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

/// One key's bucket
#[derive(Debug, Clone)]
pub(super) struct TokenBucket {
    pub tokens: f64,
    pub last_refill: Instant,
}

impl TokenBucket {
    pub fn full(policy: &RateLimitPolicy, now: Instant) -> Self {
        Self {
            tokens: policy.capacity,
            last_refill: now,
        }
    }

    /// Add `elapsed * refill_per_sec` tokens, capped at capacity
    pub fn refill(&mut self, policy: &RateLimitPolicy, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * policy.refill_per_sec).min(policy.capacity);
        self.last_refill = now;
    }

    pub fn try_take(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
