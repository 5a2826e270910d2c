//! Cache service trait and error types.

use async_trait::async_trait;
use serde_json::json;

use crate::error::AppError;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        tracing::warn!("{}", e);
        AppError::transient_cache("Cache temporarily unavailable", json!({}))
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-aside store of `short code -> target URL` entries.
///
/// The cache is derived data: any entry may vanish at any time and the only
/// cost is an extra store read. Entries carry their own TTL, unrelated to the
/// link's expiry time, so a cached entry never proves a link is still live.
///
/// Implementations must be thread-safe. Lookups and writes fail open: backend
/// errors are logged and reported as a miss or a no-op. Invalidation is the
/// exception and reports backend errors, because a surviving entry can serve
/// a stale target.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache shared between instances
/// - [`crate::infrastructure::cache::MokaCache`] - In-process cache with per-entry TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the target URL cached for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss or backend error (fail-open behavior)
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a URL mapping with an optional TTL in seconds.
    ///
    /// `None` applies the implementation's default TTL.
    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached URL mapping.
    ///
    /// Called whenever the store record behind `short_code` is written.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the backend could not confirm
    /// the removal.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
