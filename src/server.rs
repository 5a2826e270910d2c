//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and rate limiter selection, the expiry
//! sweeper, and the Axum server lifecycle.

use crate::application::services::LinkService;
use crate::config::Config;
use crate::domain::expiry_sweeper::ExpirySweeper;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheService, MokaCache, NullCache, RedisCache};
use crate::infrastructure::persistence::PgLinkRepository;
use crate::infrastructure::rate_limit::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::CodeGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Opens the PostgreSQL pool using the configured pool settings.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Chooses the cache backend: Redis when configured and reachable, the
/// in-process cache otherwise, nothing when caching is disabled.
pub async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    if !config.cache_enabled {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    }

    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
            }
        }
    }

    tracing::info!(
        max_entries = config.cache_max_entries,
        "Cache enabled (in-process)"
    );
    Arc::new(MokaCache::new(
        config.cache_max_entries,
        config.cache_ttl_seconds,
    ))
}

/// Chooses the rate limiter: Redis-backed when configured and reachable so
/// every instance shares the same counters, in-process otherwise.
pub async fn build_rate_limiter(config: &Config) -> Arc<dyn RateLimiter> {
    let policy = config.rate_limit_policy();

    if let Some(redis_url) = &config.redis_url {
        match RedisRateLimiter::connect(redis_url, policy).await {
            Ok(limiter) => {
                tracing::info!("Rate limiter enabled (Redis)");
                return Arc::new(limiter.with_timeout(config.store_timeout()));
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect rate limiter to Redis: {}. Using in-process limiter.",
                    e
                );
            }
        }
    }

    tracing::info!("Rate limiter enabled (in-process)");
    Arc::new(InMemoryRateLimiter::new(policy))
}

/// Builds the link service from configuration.
pub fn build_link_service(
    config: &Config,
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
) -> LinkService {
    LinkService::new(repository, cache)
        .with_generator(CodeGenerator::new(config.code_length))
        .with_cache_ttl(config.cache_ttl_seconds)
        .with_store_timeout(config.store_timeout())
        .with_max_generation_attempts(config.max_generation_attempts)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Cache (Redis, in-process, or disabled)
/// - Rate limiter (Redis or in-process)
/// - Background expiry sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let cache = build_cache(&config).await;
    let rate_limiter = build_rate_limiter(&config).await;
    let link_service = Arc::new(build_link_service(
        &config,
        repository.clone(),
        cache.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = ExpirySweeper::new(repository.clone(), config.sweep_interval());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    let state = AppState::new(
        link_service,
        repository,
        cache,
        rate_limiter,
        config.base_url.clone(),
    )
    .with_behind_proxy(config.behind_proxy);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, waiting for sweeper");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::error!("Expiry sweeper task failed: {}", e);
    }

    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
