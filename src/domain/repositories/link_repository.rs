//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Authoritative storage for short links.
///
/// Every method acts on a single record atomically; implementations never
/// leave a partially written link behind. Code uniqueness is guaranteed by
/// [`LinkRepository::insert`] alone: callers may pre-check with
/// [`LinkRepository::exists_by_code`], but that check is only an optimization.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - sharded in-process map
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the code already exists. The check and
    /// the write happen as one atomic step at the storage layer.
    ///
    /// Returns [`AppError::TransientStore`] or [`AppError::Internal`] on storage errors.
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found (expired links included)
    /// - `Ok(None)` if not found
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Checks whether any link uses `code`.
    async fn exists_by_code(&self, code: &str) -> Result<bool, AppError>;

    /// Inserts or replaces the link stored under `link.code`.
    ///
    /// The stored click count is never lowered: the result keeps the larger
    /// of the stored and the supplied counter.
    async fn save(&self, link: Link) -> Result<Link, AppError>;

    /// Atomically increments the click counter of a live link.
    ///
    /// The increment happens only if the link exists and is not expired at
    /// `now`. Returns the updated link, or `Ok(None)` when nothing was counted.
    async fn record_click(&self, code: &str, now: DateTime<Utc>)
    -> Result<Option<Link>, AppError>;

    /// Deletes every link whose `expires_at` is strictly before `before`.
    ///
    /// Returns the number of deleted rows. Running it twice is harmless.
    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, AppError>;

    /// Lists every stored link, newest first.
    async fn list_all(&self) -> Result<Vec<Link>, AppError>;

    /// Checks if the storage backend is reachable.
    async fn health_check(&self) -> bool;
}
