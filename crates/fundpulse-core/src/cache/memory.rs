//! Process-local cache tier

use super::types::{CacheBackend, CacheEntry, CacheStore};
use crate::error::PulseResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;

/// In-memory store. Entries never expire on their own, so every read checks
/// the deadline and removes what it finds stale.
///
/// The map holds at most `max_entries`: a write past the budget first purges
/// expired entries, then evicts the live ones closest to expiry.
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Purged expired cache entries");
        }
        removed
    }

    fn evict_soonest_expiring(&self) -> bool {
        let key = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());
        match key {
            Some(key) => {
                self.entries.remove(&key);
                debug!(key = %key, "Evicted live cache entry over budget");
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> PulseResult<Option<Vec<u8>>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PulseResult<()> {
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        if self.entries.len() > self.max_entries {
            self.purge_expired();
        }
        while self.entries.len() > self.max_entries {
            if !self.evict_soonest_expiring() {
                break;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> PulseResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Memory
    }
}
