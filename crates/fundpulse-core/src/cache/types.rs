//! Cache types and the storage contract

use crate::error::PulseResult;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Which tier backs the cache service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Shared remote cache, TTL enforced by the server
    Redis,
    /// Process-local map with explicit expiry checks
    Memory,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// A stored value and the instant after which it must not be returned
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub expires_at: Instant,
}

/// Deadline used when `now + ttl` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

impl CacheEntry {
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { value, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Byte-oriented cache storage shared by both tiers
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live value; expired entries read as missing
    async fn get(&self, key: &str) -> PulseResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one wholesale
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PulseResult<()>;

    async fn delete(&self, key: &str) -> PulseResult<()>;

    fn backend(&self) -> CacheBackend;
}
