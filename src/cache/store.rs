//! Key-value store abstraction behind the cache client.
//!
//! A [`KvStore`] is a fallible, string-valued store. The [`CacheClient`]
//! wraps one and turns every failure into a miss or a `false`.
//!
//! [`CacheClient`]: crate::cache::client::CacheClient

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache is not connected")]
    Disconnected,

    #[error("Cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// A remote (or in-process) key-value store holding JSON text payloads.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the raw payload stored under `key`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl` when one is given.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Lightweight liveness probe.
    async fn ping(&self) -> CacheResult<()>;

    /// Release underlying connections.
    async fn close(&self) {}

    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;
}
