//! Caching layer for fast redirect lookups.
//!
//! Provides a [`CacheService`] trait with three implementations:
//! - [`RedisCache`] - Redis-backed cache shared by every instance
//! - [`MokaCache`] - In-process cache used when Redis is not configured
//! - [`NullCache`] - No-op implementation for disabled caching

mod moka_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use moka_cache::MokaCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub(crate) use redis_cache::connect_manager;
pub use service::{CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;
