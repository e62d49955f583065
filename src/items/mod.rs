//! The items resource.
//!
//! - [`model`]: `Item`, `NewItem`, `ItemUpdate` and the `Patch` field type
//! - [`store`]: the authoritative record store
//! - [`service`]: cache-aside coordinator over the store and the cache client
//! - [`pagination`]: page requests and page slicing
//! - [`validation`]: field-level validation errors

pub mod model;
pub mod pagination;
pub mod service;
pub mod store;
pub mod validation;

pub use model::{Item, ItemUpdate, NewItem, Patch};
pub use pagination::{Page, PageRequest};
pub use service::{ItemService, ServiceError};
pub use store::{ItemRepository, MemoryItemStore, StoreError};
pub use validation::ValidationError;
