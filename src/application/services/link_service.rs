//! Short link lifecycle: creation, resolution and administration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, validate_custom_code};
use crate::utils::url_validator::validate_long_url;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Retries after the first attempt for idempotent reads.
const READ_RETRIES: usize = 2;

/// Service orchestrating code allocation, cache-aside resolution and click
/// counting on top of a [`LinkRepository`] and a [`CacheService`].
///
/// The repository is authoritative. The cache only saves the existence lookup
/// on resolution; click counting and expiry enforcement always go through the
/// repository's atomic [`LinkRepository::record_click`].
///
/// Every repository call is bounded by the store timeout, which surfaces as
/// [`AppError::TransientStore`]. Cache calls share the same bound but fail
/// open, except the invalidation in [`Self::put_link`].
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    generator: CodeGenerator,
    cache_ttl_seconds: u64,
    store_timeout: Duration,
    max_generation_attempts: u32,
}

impl LinkService {
    /// Creates a service with default tuning and an OS-seeded code generator.
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            repository,
            cache,
            generator: CodeGenerator::default(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }

    pub fn with_generator(mut self, generator: CodeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_cache_ttl(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Sets the bound on generated-code attempts (at least one).
    pub fn with_max_generation_attempts(mut self, attempts: u32) -> Self {
        self.max_generation_attempts = attempts.max(1);
        self
    }

    /// Length of generated codes.
    pub fn code_length(&self) -> usize {
        self.generator.code_length()
    }

    /// Creates a short link.
    ///
    /// With `custom_code` the code is validated and must be free; the custom
    /// path is never retried. Without it a random code is allocated, retrying
    /// on collision up to the configured attempt bound. `ttl_hours` of zero or
    /// `None` creates a link that never expires.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad URL, custom code or TTL
    /// - [`AppError::Conflict`] if the custom code is taken
    /// - [`AppError::GenerationExhausted`] if every generated code collided
    /// - [`AppError::TransientStore`] if the repository is slow or unreachable
    pub async fn create(
        &self,
        long_url: String,
        custom_code: Option<String>,
        ttl_hours: Option<u32>,
    ) -> Result<Link, AppError> {
        validate_long_url(&long_url).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
        })?;

        let expires_at = expiry_from_ttl(Utc::now(), ttl_hours)?;

        let link = match custom_code {
            Some(code) => self.insert_custom(code, long_url, expires_at).await?,
            None => self.insert_generated(long_url, expires_at).await?,
        };

        // A stale entry may survive from an expired link swept under the same code.
        self.cache_invalidate(&link.code).await;

        info!(code = %link.code, expires_at = ?link.expires_at, "Short link created");
        Ok(link)
    }

    /// Resolves a short code to its target URL, counting one click.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no link has this code
    /// - [`AppError::Expired`] if the link exists but has expired
    /// - [`AppError::TransientStore`] if the repository is slow or unreachable
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let now = Utc::now();

        if self.cache_get(code).await.is_none() {
            let link = self.find_with_retry(code).await?.ok_or_else(|| not_found(code))?;

            if link.is_expired_at(now) {
                return Err(expired(&link));
            }
        }

        let link = match self
            .store_call("record_click", self.repository.record_click(code, now))
            .await?
        {
            Some(link) => link,
            None => {
                // Deleted or expired since the lookup (or the cache entry was stale).
                return Err(match self.find_with_retry(code).await? {
                    Some(link) if link.is_expired_at(now) => expired(&link),
                    _ => not_found(code),
                });
            }
        };

        self.cache_set(&link.code, &link.long_url).await;

        debug!(code = %link.code, clicks = link.click_count, "Short link resolved");
        Ok(link.long_url)
    }

    /// Returns a link with its current click count, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    pub async fn get_clicks(&self, code: &str) -> Result<Link, AppError> {
        self.find_with_retry(code)
            .await?
            .ok_or_else(|| not_found(code))
    }

    /// Lists every stored link, newest first.
    pub async fn list_links(&self) -> Result<Vec<Link>, AppError> {
        let strategy = read_retry_strategy();

        RetryIf::start(
            strategy,
            move || self.store_call("list_all", self.repository.list_all()),
            AppError::is_transient,
        )
        .await
    }

    /// Creates or overwrites the link stored under `code`.
    ///
    /// The click count of an existing link is kept. The cache entry is always
    /// invalidated afterwards so the next resolution reads the new target.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad URL or code
    /// - [`AppError::TransientCache`] if the stale cache entry could not be
    ///   invalidated; the repository write has already happened
    pub async fn put_link(
        &self,
        code: &str,
        long_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        validate_custom_code(code)?;
        validate_long_url(&long_url).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
        })?;

        let existing = self.find_with_retry(code).await?;
        let link = match existing {
            Some(mut link) => {
                link.long_url = long_url;
                link.expires_at = expires_at;
                link
            }
            None => Link::new(code.to_string(), long_url, 0, Utc::now(), expires_at),
        };

        let saved = self
            .store_call("save", self.repository.save(link))
            .await?;

        match tokio::time::timeout(self.store_timeout, self.cache.invalidate(code)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(code, "Cache invalidation timed out");
                return Err(AppError::transient_cache(
                    "Cache temporarily unavailable",
                    json!({ "code": code }),
                ));
            }
        }

        info!(code, "Short link written");
        Ok(saved)
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, base_url: &str, code: &str) -> String {
        format!("{}/r/{}", base_url.trim_end_matches('/'), code)
    }

    async fn insert_custom(
        &self,
        code: String,
        long_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        validate_custom_code(&code)?;

        if self
            .store_call("exists_by_code", self.repository.exists_by_code(&code))
            .await?
        {
            return Err(code_taken(&code));
        }

        let new_link = NewLink {
            code: code.clone(),
            long_url,
            expires_at,
        };

        match self
            .store_call("insert", self.repository.insert(new_link))
            .await
        {
            Err(AppError::Conflict { .. }) => Err(code_taken(&code)),
            other => other,
        }
    }

    async fn insert_generated(
        &self,
        long_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        for attempt in 1..=self.max_generation_attempts {
            let code = self.generator.generate();

            if self
                .store_call("exists_by_code", self.repository.exists_by_code(&code))
                .await?
            {
                debug!(attempt, "Generated code already in use");
                continue;
            }

            let new_link = NewLink {
                code,
                long_url: long_url.clone(),
                expires_at,
            };

            match self
                .store_call("insert", self.repository.insert(new_link))
                .await
            {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated code taken concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        error!(
            attempts = self.max_generation_attempts,
            "Short code generation exhausted"
        );
        Err(AppError::generation_exhausted(
            "Failed to generate a unique short code",
            json!({ "attempts": self.max_generation_attempts }),
        ))
    }

    async fn find_with_retry(&self, code: &str) -> Result<Option<Link>, AppError> {
        let strategy = read_retry_strategy();

        RetryIf::start(
            strategy,
            move || self.store_call("find_by_code", self.repository.find_by_code(code)),
            AppError::is_transient,
        )
        .await
    }

    async fn store_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.store_timeout, "Store call timed out");
                Err(AppError::transient_store(
                    "Storage temporarily unavailable",
                    json!({ "operation": operation }),
                ))
            }
        }
    }

    async fn cache_get(&self, code: &str) -> Option<String> {
        match tokio::time::timeout(self.store_timeout, self.cache.get_url(code)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!(code, "Cache read failed: {}", e);
                None
            }
            Err(_) => {
                warn!(code, "Cache read timed out");
                None
            }
        }
    }

    async fn cache_set(&self, code: &str, long_url: &str) {
        let write = self
            .cache
            .set_url(code, long_url, Some(self.cache_ttl_seconds));

        match tokio::time::timeout(self.store_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(code, "Cache write failed: {}", e),
            Err(_) => warn!(code, "Cache write timed out"),
        }
    }

    async fn cache_invalidate(&self, code: &str) {
        match tokio::time::timeout(self.store_timeout, self.cache.invalidate(code)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(code, "Cache invalidation failed: {}", e),
            Err(_) => warn!(code, "Cache invalidation timed out"),
        }
    }
}

fn read_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_millis(200))
        .map(jitter)
        .take(READ_RETRIES)
}

/// Computes the expiry instant for a TTL in hours; zero means never.
fn expiry_from_ttl(
    now: DateTime<Utc>,
    ttl_hours: Option<u32>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match ttl_hours {
        None | Some(0) => Ok(None),
        Some(hours) => now
            .checked_add_signed(TimeDelta::hours(i64::from(hours)))
            .map(Some)
            .ok_or_else(|| {
                AppError::bad_request(
                    "Expiration is too far in the future",
                    json!({ "expiration_hours": hours }),
                )
            }),
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

fn expired(link: &Link) -> AppError {
    AppError::expired(
        "Short link has expired",
        json!({ "code": link.code, "expired_at": link.expires_at }),
    )
}

fn code_taken(code: &str) -> AppError {
    AppError::conflict("Custom code already exists", json!({ "code": code }))
}
