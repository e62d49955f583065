//! item-cache-service: an items CRUD service with a Redis cache-aside layer.
//!
//! Reads go through the cache and fall back to the authoritative record
//! store; writes go to the store first and then refresh or invalidate the
//! cache. The cache is optional: when Redis is unreachable every request is
//! served from the store.
//!
//! The HTTP surface adds request-id propagation, Prometheus metrics and
//! Kubernetes-style health probes.

pub mod cache;
pub mod config;
pub mod items;
pub mod server;
pub mod telemetry;
