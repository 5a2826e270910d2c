//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::rate_limit::RateLimiter;

/// Application state shared across all request handlers.
///
/// Cheap to clone: every collaborator sits behind an `Arc`. The repository
/// and cache are held alongside the service for health checks.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub base_url: String,
    /// Trust `X-Forwarded-For` / `X-Real-IP` when keying rate limits.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        rate_limiter: Arc<dyn RateLimiter>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            link_service,
            repository,
            cache,
            rate_limiter,
            base_url: base_url.into(),
            behind_proxy: false,
        }
    }

    pub fn with_behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }
}
