mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use link_lifecycle::AppError;
use link_lifecycle::domain::entities::{Link, NewLink};
use link_lifecycle::domain::repositories::LinkRepository;
use link_lifecycle::infrastructure::cache::{CacheResult, CacheService, MokaCache, NullCache};
use link_lifecycle::infrastructure::persistence::InMemoryLinkRepository;
use serde_json::json;
use std::sync::Arc;

/// Storage that is never reachable.
struct UnreachableRepository;

fn unavailable() -> AppError {
    AppError::transient_store("Storage temporarily unavailable", json!({}))
}

#[async_trait]
impl LinkRepository for UnreachableRepository {
    async fn insert(&self, _new_link: NewLink) -> Result<Link, AppError> {
        Err(unavailable())
    }

    async fn find_by_code(&self, _code: &str) -> Result<Option<Link>, AppError> {
        Err(unavailable())
    }

    async fn exists_by_code(&self, _code: &str) -> Result<bool, AppError> {
        Err(unavailable())
    }

    async fn save(&self, _link: Link) -> Result<Link, AppError> {
        Err(unavailable())
    }

    async fn record_click(
        &self,
        _code: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        Err(unavailable())
    }

    async fn delete_expired_before(&self, _before: DateTime<Utc>) -> Result<u64, AppError> {
        Err(unavailable())
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        Err(unavailable())
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Cache whose health check never answers.
struct HangingCache;

#[async_trait]
impl CacheService for HangingCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(
        &self,
        _short_code: &str,
        _original_url: &str,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _short_code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_health_check_healthy() {
    let app = common::create_test_app();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_check_with_cache_disabled() {
    let state = common::create_test_state(
        Arc::new(InMemoryLinkRepository::new()),
        Arc::new(NullCache::new()),
    );
    let server = common::server_for(state);

    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_health_check_degraded_when_store_unreachable() {
    let state = common::create_test_state(
        Arc::new(UnreachableRepository),
        Arc::new(MokaCache::new(100, 60)),
    );
    let server = common::server_for(state);

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["database"]["status"], "error");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_unreachable_store_maps_to_service_unavailable() {
    let state = common::create_test_state(
        Arc::new(UnreachableRepository),
        Arc::new(MokaCache::new(100, 60)),
    );
    let server = common::server_for(state);

    let response = server.get("/r/promo").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "transient_store_failure");
}

#[tokio::test(start_paused = true)]
async fn test_health_check_hanging_cache_is_degraded() {
    let state = common::create_test_state(
        Arc::new(InMemoryLinkRepository::new()),
        Arc::new(HangingCache),
    );
    let server = common::server_for(state);

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "error");
}
