//! Keyed token bucket limiter with an optional idle sweeper

use super::types::{RateLimitPolicy, TokenBucket};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Token bucket rate limiter keyed by caller identity
#[derive(Debug)]
pub struct KeyedRateLimiter {
    name: String,
    policy: RateLimitPolicy,
    buckets: DashMap<String, TokenBucket>,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl KeyedRateLimiter {
    pub fn new(name: impl Into<String>, policy: RateLimitPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            buckets: DashMap::new(),
            sweeper: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Take one token for `key`, creating a full bucket on first sight
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let allowed = match self.buckets.get_mut(key) {
            Some(mut bucket) => {
                bucket.refill(&self.policy, now);
                bucket.try_take()
            }
            None => self
                .buckets
                .entry(key.to_string())
                .or_insert_with(|| TokenBucket::full(&self.policy, now))
                .try_take(),
        };

        if !allowed {
            debug!(limiter = %self.name, key, "Rate limit exceeded");
        }
        allowed
    }

    /// Tokens currently available to `key` without consuming any
    pub fn available(&self, key: &str) -> f64 {
        match self.buckets.get_mut(key) {
            Some(mut bucket) => {
                bucket.refill(&self.policy, Instant::now());
                bucket.tokens
            }
            None => self.policy.capacity,
        }
    }

    /// Number of keys with a live bucket
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Evict buckets idle for longer than the policy's idle TTL.
    /// Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let ttl = self.policy.idle_ttl();
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < ttl);
        before.saturating_sub(self.buckets.len())
    }

    /// Start the background sweep. Returns immediately; calling it again
    /// while a sweeper runs is a no-op.
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let mut slot = self.sweeper.lock();
        if slot.is_some() {
            return;
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());

        let limiter: Weak<Self> = Arc::downgrade(self);
        let name = self.name.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(limiter) = limiter.upgrade() else { break };
                        let evicted = limiter.sweep();
                        if evicted > 0 {
                            debug!(limiter = %name, evicted, "Swept idle rate limit buckets");
                        }
                    }
                }
            }
            info!(limiter = %name, "Rate limit sweeper stopped");
        });
    }

    /// Stop the background sweep. Safe to call more than once.
    pub fn stop(&self) {
        if let Some(token) = self.sweeper.lock().take() {
            token.cancel();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }
}

impl Drop for KeyedRateLimiter {
    fn drop(&mut self) {
        self.stop();
    }
}
