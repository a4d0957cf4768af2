//! Dual-mode cache service
//!
//! A shared Redis tier is tried once at startup. If it is not configured or
//! not reachable, the process-local tier is used for the rest of the process
//! lifetime. Callers see one interface either way.

mod memory;
mod redis;
mod types;


pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use types::{CacheBackend, CacheEntry, CacheStore};

use crate::config::CacheSettings;
use crate::error::PulseResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache facade used by the crawler context builder
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    key_prefix: String,
}

impl CacheService {
    /// Select the tier once. Never fails: an unreachable Redis falls back
    /// to memory.
    pub async fn connect(settings: &CacheSettings) -> Self {
        let store: Arc<dyn CacheStore> = match settings.redis_url.as_deref() {
            Some(url) if !url.is_empty() => {
                match RedisStore::connect(url, settings.connect_timeout()).await {
                    Ok(store) => {
                        info!("Using shared redis cache");
                        Arc::new(store)
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis unavailable, using in-process cache");
                        Arc::new(MemoryStore::new(settings.max_local_entries))
                    }
                }
            }
            _ => {
                info!("No redis configured, using in-process cache");
                Arc::new(MemoryStore::new(settings.max_local_entries))
            }
        };
        Self::with_store(store, settings.key_prefix.clone())
    }

    /// Wrap an explicit store
    pub fn with_store(store: Arc<dyn CacheStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Process-local cache with default limits
    pub fn in_memory() -> Self {
        let settings = CacheSettings::default();
        Self::with_store(
            Arc::new(MemoryStore::new(settings.max_local_entries)),
            settings.key_prefix,
        )
    }

    pub fn backend(&self) -> CacheBackend {
        self.store.backend()
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Read a value. Backend errors are logged and read as a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(&self.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, backend = %self.backend(), error = %e, "Cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PulseResult<()> {
        self.store.set(&self.key(key), value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> PulseResult<()> {
        self.store.delete(&self.key(key)).await
    }

    /// Read and decode a JSON value. Undecodable bytes read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> PulseResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl).await
    }

    /// Return the cached value or run `loader` and memoize its result.
    ///
    /// Loader errors are returned and nothing is cached. A failed write is
    /// logged; the loaded value is still returned.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> PulseResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PulseResult<T>>,
    {
        if let Some(hit) = self.get_json::<T>(key).await {
            debug!(key, "Cache hit");
            return Ok(hit);
        }

        let value = loader().await?;
        if let Err(e) = self.set_json(key, &value, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
        Ok(value)
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("backend", &self.backend())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}
