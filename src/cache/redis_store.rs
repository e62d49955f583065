//! Redis-backed [`KvStore`] using a bounded `deadpool-redis` connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::store::{CacheResult, KvStore};
use crate::config::RedisConfig;

pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build the connection pool. Connections are opened lazily, so this
    /// succeeds even when the server is down; call [`KvStore::ping`] to verify.
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(timeout);
        timeouts.create = Some(timeout);
        timeouts.recycle = Some(timeout);

        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts = timeouts;

        let mut cfg = deadpool_redis::Config::from_url(config.url.clone());
        cfg.pool = Some(pool_config);

        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        debug!(pool_size = config.pool_size, ?timeout, "Redis pool created");

        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        match ttl {
            Some(ttl) if !ttl.is_zero() => {
                // SETEX has whole-second resolution.
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, secs).await?;
            }
            _ => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.pool.get().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
