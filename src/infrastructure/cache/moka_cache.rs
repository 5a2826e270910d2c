//! In-process cache backed by moka.

use std::time::{Duration, Instant};

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

#[derive(Clone)]
struct CachedUrl {
    url: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache used when Redis is not configured.
///
/// Entries are evicted by size (TinyLFU) or when their TTL lapses, whichever
/// comes first. Not shared between instances, so a multi-instance deployment
/// should use [`crate::infrastructure::cache::RedisCache`] instead.
pub struct MokaCache {
    inner: Cache<String, CachedUrl>,
    default_ttl: Duration,
}

impl MokaCache {
    pub fn new(max_entries: u64, default_ttl_seconds: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            inner,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }
}

#[async_trait]
impl CacheService for MokaCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let hit = self.inner.get(short_code).await.map(|entry| entry.url);

        if hit.is_some() {
            debug!("Cache HIT: {}", short_code);
        } else {
            debug!("Cache MISS: {}", short_code);
        }

        Ok(hit)
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let ttl = ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl);

        self.inner
            .insert(
                short_code.to_string(),
                CachedUrl {
                    url: original_url.to_string(),
                    ttl,
                },
            )
            .await;

        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.inner.invalidate(short_code).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
