//! Record store: the authoritative collection of items.
//!
//! The store owns item lifetime. [`MemoryItemStore`] keeps everything in
//! process memory behind a single lock, so every read observes the latest
//! write and a read-modify-write `update` cannot lose a concurrent update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::items::model::{Item, ItemUpdate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item {0} not found")]
    NotFound(String),

    #[error("Item {0} already exists")]
    Duplicate(String),

    /// Failure of the underlying storage; fatal to the enclosing operation.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Storage seam for items. Implementations must be strongly consistent.
pub trait ItemRepository: Send + Sync {
    fn insert(&self, item: Item) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// Merge the present fields of `update` into the stored item and stamp
    /// `updated_at = now`. Returns the merged item.
    fn update(&self, id: &str, update: &ItemUpdate, now: DateTime<Utc>)
        -> Result<Item, StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Every item, in insertion order.
    fn list_all(&self) -> Result<Vec<Item>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}

#[derive(Default)]
struct Inner {
    items: HashMap<String, Item>,
    /// Ids in insertion order.
    order: Vec<String>,
}

#[derive(Default)]
pub struct MemoryItemStore {
    inner: RwLock<Inner>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemRepository for MemoryItemStore {
    fn insert(&self, item: Item) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.items.contains_key(&item.id) {
            return Err(StoreError::Duplicate(item.id));
        }
        inner.order.push(item.id.clone());
        inner.items.insert(item.id.clone(), item);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.inner.read().items.get(id).cloned())
    }

    fn update(
        &self,
        id: &str,
        update: &ItemUpdate,
        now: DateTime<Utc>,
    ) -> Result<Item, StoreError> {
        let mut inner = self.inner.write();
        let item = inner
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply_to(item, now);
        Ok(item.clone())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.items.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        inner.order.retain(|existing| existing != id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id).cloned())
            .collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::model::{NewItem, Patch};
    use std::sync::Arc;

    fn item(id: &str, name: &str) -> Item {
        NewItem::new(name, 1.0).into_item(id.to_string(), Utc::now())
    }

    #[test]
    fn test_insert_get_and_order() {
        let store = MemoryItemStore::new();
        store.insert(item("b", "second?")).unwrap();
        store.insert(item("a", "first?")).unwrap();
        store.insert(item("c", "third")).unwrap();

        let ids: Vec<String> = store.list_all().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(store.get("a").unwrap().unwrap().name, "first?");
        assert!(store.get("missing").unwrap().is_none());
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let store = MemoryItemStore::new();
        store.insert(item("a", "x")).unwrap();
        assert_eq!(
            store.insert(item("a", "y")),
            Err(StoreError::Duplicate("a".to_string()))
        );
        assert_eq!(store.get("a").unwrap().unwrap().name, "x");
    }

    #[test]
    fn test_update_merges() {
        let store = MemoryItemStore::new();
        store.insert(item("a", "x")).unwrap();

        let now = Utc::now();
        let update = ItemUpdate {
            quantity: Patch::Value(7),
            ..Default::default()
        };
        let merged = store.update("a", &update, now).unwrap();

        assert_eq!(merged.name, "x");
        assert_eq!(merged.quantity, 7);
        assert_eq!(merged.updated_at, now);
        assert_eq!(store.get("a").unwrap().unwrap(), merged);

        assert_eq!(
            store.update("missing", &update, now),
            Err(StoreError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_delete_keeps_remaining_order() {
        let store = MemoryItemStore::new();
        for id in ["a", "b", "c"] {
            store.insert(item(id, id)).unwrap();
        }
        store.delete("b").unwrap();
        assert_eq!(
            store.delete("b"),
            Err(StoreError::NotFound("b".to_string()))
        );

        let ids: Vec<String> = store.list_all().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryItemStore::new());
        store.insert(item("a", "x")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let update = ItemUpdate {
                        tags: Patch::Value(vec![format!("t{i}")]),
                        ..Default::default()
                    };
                    store.update("a", &update, Utc::now()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.get("a").unwrap().unwrap();
        assert_eq!(stored.tags.len(), 1);
        assert_eq!(stored.name, "x");
    }
}
