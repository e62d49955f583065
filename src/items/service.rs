//! Cache-aside coordinator for items.
//!
//! The record store is authoritative. The cache is written only after the
//! store write succeeds, and the list key is invalidated after every
//! mutation. Cache calls never fail an operation: the client absorbs them.
//!
//! ```text
//! create:  store.insert -> cache.set(entity) -> cache.delete(list)
//! get:     cache.get(entity) ─hit─> return
//!                            └miss─> store.get -> cache.set(entity) -> return
//! update:  store.update -> cache.set(entity) -> cache.delete(list)
//! delete:  store.delete -> cache.delete(entity) -> cache.delete(list)
//! list:    store.list_all -> paginate
//! ```
//!
//! A cache hit is trusted without consulting the store, so a stale entry is
//! served until it expires or is overwritten. Concurrent mutations of the same
//! id interleave at cache suspension points and the cache copy is
//! last-write-wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::CacheClient;
use crate::items::model::{Item, ItemUpdate, NewItem};
use crate::items::pagination::{paginate, Page, PageRequest};
use crate::items::store::{ItemRepository, StoreError};
use crate::telemetry::metrics::Metrics;

/// Key prefix for cached items.
pub const ENTITY_KEY_PREFIX: &str = "entity:";

/// List-view key; only ever invalidated.
pub const LIST_KEY: &str = "entities:list";

/// Operation label for cache hit/miss metrics on single-item reads.
const GET_OPERATION: &str = "get_item";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Item {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Cache key for one item.
pub fn entity_key(id: &str) -> String {
    format!("{ENTITY_KEY_PREFIX}{id}")
}

pub struct ItemService {
    store: Arc<dyn ItemRepository>,
    cache: Arc<CacheClient>,
    metrics: Arc<Metrics>,
    ttl: Duration,
}

impl ItemService {
    pub fn new(
        store: Arc<dyn ItemRepository>,
        cache: Arc<CacheClient>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            ttl,
        }
    }

    pub fn cache(&self) -> &Arc<CacheClient> {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create an item. Only a store failure fails the call.
    pub async fn create(&self, new_item: NewItem) -> ServiceResult<Item> {
        let id = Uuid::new_v4().to_string();
        let item = new_item.into_item(id.clone(), Utc::now());

        self.store.insert(item.clone())?;

        self.cache.set(&entity_key(&id), &item, Some(self.ttl)).await;
        self.cache.delete(LIST_KEY).await;

        self.metrics.record_item_created();
        info!(item_id = %id, "Created item");

        Ok(item)
    }

    /// Read an item, preferring the cache and filling it on a miss.
    pub async fn get(&self, id: &str) -> ServiceResult<Item> {
        let key = entity_key(id);

        if let Some(item) = self.cache.get::<Item>(&key).await {
            self.metrics.record_cache_hit(GET_OPERATION);
            debug!(item_id = %id, "Cache hit");
            return Ok(item);
        }
        self.metrics.record_cache_miss(GET_OPERATION);

        let item = self
            .store
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        self.cache.set(&key, &item, Some(self.ttl)).await;
        Ok(item)
    }

    /// Merge `update` into an existing item. Existence is decided by the store.
    pub async fn update(&self, id: &str, update: ItemUpdate) -> ServiceResult<Item> {
        let item = self.store.update(id, &update, Utc::now())?;

        self.cache.set(&entity_key(id), &item, Some(self.ttl)).await;
        self.cache.delete(LIST_KEY).await;

        info!(item_id = %id, "Updated item");
        Ok(item)
    }

    /// Remove an item. A second delete of the same id is `NotFound`.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.store.delete(id)?;

        self.cache.delete(&entity_key(id)).await;
        self.cache.delete(LIST_KEY).await;

        self.metrics.record_item_deleted();
        info!(item_id = %id, "Deleted item");
        Ok(())
    }

    /// One page of items in creation order, always computed from the store.
    pub async fn list(&self, request: PageRequest) -> ServiceResult<Page<Item>> {
        let all = self.store.list_all()?;
        Ok(paginate(all, request))
    }
}
