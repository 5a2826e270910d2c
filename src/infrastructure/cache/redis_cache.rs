//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Redis cache implementation for fast URL lookups.
///
/// Uses `ConnectionManager` for automatic reconnection and cheap cloning.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::set_url`] is called
    ///   with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        let manager = connect_manager(redis_url).await?;

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }
}

/// Opens a managed Redis connection and verifies it with a PING.
///
/// Shared by the cache and the Redis rate limiter.
pub(crate) async fn connect_manager(redis_url: &str) -> CacheResult<ConnectionManager> {
    info!("Connecting to Redis");

    let client = Client::open(redis_url).map_err(|e| {
        CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
    })?;

    let manager = ConnectionManager::new(client)
        .await
        .map_err(|e| CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

    info!("✓ Connected to Redis");

    Ok(manager)
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();

        let cached = conn
            .get::<_, Option<String>>(self.build_key(short_code))
            .await
            .unwrap_or_else(|e| {
                warn!(code = short_code, "Redis GET failed: {}", e);
                None
            });

        debug!(code = short_code, hit = cached.is_some(), "Redis cache lookup");
        Ok(cached)
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let ttl_seconds = ttl_seconds.unwrap_or(self.default_ttl).max(1);
        let mut conn = self.client.clone();

        if let Err(e) = conn
            .set_ex::<_, _, ()>(self.build_key(short_code), original_url, ttl_seconds)
            .await
        {
            warn!(code = short_code, "Redis SETEX failed: {}", e);
        }

        Ok(())
    }

    /// Deletes the entry. Unlike reads and writes this does not fail open:
    /// an entry that may have survived is reported so the caller can decide.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        let removed = conn
            .del::<_, u32>(self.build_key(short_code))
            .await
            .map_err(|e| CacheError::OperationError(format!("DEL {short_code}: {e}")))?;

        if removed > 0 {
            debug!(code = short_code, "Redis cache entry invalidated");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
