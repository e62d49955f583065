//! The cache client: a total, failure-isolating facade over a [`KvStore`].
//!
//! Every operation returns a plain value. Transport errors, timeouts and
//! (de)serialization failures are logged at `warn` and turned into a miss or
//! `false`, so an unavailable cache only costs performance.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::redis_store::RedisStore;
use crate::cache::store::{CacheError, CacheResult, KvStore};
use crate::config::RedisConfig;

pub struct CacheClient {
    /// `None` until connected, and again after `disconnect`.
    store: RwLock<Option<Arc<dyn KvStore>>>,
    op_timeout: Duration,
}

impl CacheClient {
    /// Create a disconnected client. Every call is a miss until a store is attached.
    pub fn new(op_timeout: Duration) -> Self {
        Self {
            store: RwLock::new(None),
            op_timeout,
        }
    }

    /// Create a client already attached to `store`.
    pub fn with_store(store: Arc<dyn KvStore>, op_timeout: Duration) -> Self {
        Self {
            store: RwLock::new(Some(store)),
            op_timeout,
        }
    }

    /// Open the Redis pool and verify it with a single PING.
    ///
    /// This is the only place a cache failure is returned to the caller; it is
    /// meant for startup.
    pub async fn connect(&self, config: &RedisConfig) -> CacheResult<()> {
        let store = RedisStore::new(config)?;

        if let Err(e) = self.run(store.ping()).await {
            error!(error = %e, "Failed to connect to Redis");
            store.close().await;
            return Err(e);
        }

        self.attach(Arc::new(store)).await;
        info!(pool_size = config.pool_size, "Redis connection established");
        Ok(())
    }

    /// Install `store`, closing any store that was attached before.
    pub async fn attach(&self, store: Arc<dyn KvStore>) {
        let previous = self.store.write().await.replace(store);
        if let Some(previous) = previous {
            previous.close().await;
        }
    }

    /// Release the underlying store. Safe to call more than once.
    pub async fn disconnect(&self) {
        let store = self.store.write().await.take();
        if let Some(store) = store {
            store.close().await;
            info!(backend = store.backend_name(), "Cache connection closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.store.read().await.is_some()
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Fetch and decode the value under `key`. Any failure reads as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.current().await?;

        let raw = match self.run(store.get(key)).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!(operation = "get", key, error = %e, "Cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(operation = "get", key, error = %e, "Cache payload could not be decoded");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it, with an expiry when `ttl` is set.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let Some(store) = self.current().await else {
            return false;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(operation = "set", key, error = %CacheError::from(e), "Cache set failed");
                return false;
            }
        };

        match self.run(store.set(key, payload, ttl)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(operation = "set", key, error = %e, "Cache set failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(store) = self.current().await else {
            return false;
        };

        match self.run(store.delete(key)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(operation = "delete", key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        let Some(store) = self.current().await else {
            return false;
        };

        match self.run(store.exists(key)).await {
            Ok(found) => found,
            Err(e) => {
                debug!(operation = "exists", key, error = %e, "Cache exists failed");
                false
            }
        }
    }

    /// Liveness probe. `false` when disconnected or on any error.
    pub async fn health_check(&self) -> bool {
        self.check().await.is_ok()
    }

    /// Liveness probe that reports round-trip latency or the failure cause.
    pub async fn check(&self) -> CacheResult<Duration> {
        let store = self.current().await.ok_or(CacheError::Disconnected)?;
        let start = Instant::now();
        self.run(store.ping()).await?;
        Ok(start.elapsed())
    }

    async fn current(&self) -> Option<Arc<dyn KvStore>> {
        self.store.read().await.clone()
    }

    async fn run<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}
