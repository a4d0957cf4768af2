//! Shared cache tier backed by Redis

use super::types::{CacheBackend, CacheStore};
use crate::error::{PulseError, PulseResult};
use ::redis::AsyncCommands;
use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Redis store. TTLs are enforced by the server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and verify the server answers, all within `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> PulseResult<Self> {
        let client = ::redis::Client::open(url)?;
        let attempt = async {
            let mut conn = ConnectionManager::new(client).await?;
            let pong: String = ::redis::cmd("PING").query_async(&mut conn).await?;
            debug!(reply = %pong, "Redis answered");
            Ok::<_, PulseError>(conn)
        };

        let conn = tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| PulseError::cache(format!("connecting to redis timed out after {:?}", timeout)))??;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> PulseResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PulseResult<()> {
        let mut conn = self.conn.clone();
        let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
        let _: () = ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> PulseResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
