//! Side cache used by the item service.
//!
//! - [`store`]: the `KvStore` trait and `CacheError`
//! - [`client`]: `CacheClient`, the total get/set/delete/exists/health facade
//! - [`redis_store`]: Redis backend over a bounded connection pool
//! - [`memory`]: in-process backend with expiry

pub mod client;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use client::CacheClient;
pub use memory::MemoryStore;
pub use store::{CacheError, CacheResult, KvStore};
