//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "code, long_url, click_count, created_at, expires_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    code: String,
    long_url: String,
    click_count: i64,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link::new(
            row.code,
            row.long_url,
            u64::try_from(row.click_count).unwrap_or(0),
            row.created_at,
            row.expires_at,
        )
    }
}

/// PostgreSQL repository for link storage.
///
/// Uniqueness comes from the `links.code` primary key and click counting
/// from a single `UPDATE ... RETURNING` statement, so neither depends on
/// application-level locking.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let code = new_link.code.clone();

        let result = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (code, long_url, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.code)
        .bind(&new_link.long_url)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(e) => match AppError::from(e) {
                AppError::Conflict { .. } => Err(AppError::conflict(
                    "Short code already exists",
                    json!({ "code": code }),
                )),
                other => Err(other),
            },
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM links WHERE code = $1)")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn save(&self, link: Link) -> Result<Link, AppError> {
        let click_count = i64::try_from(link.click_count).unwrap_or(i64::MAX);

        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (code, long_url, click_count, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE SET
                long_url = EXCLUDED.long_url,
                click_count = GREATEST(links.click_count, EXCLUDED.click_count),
                expires_at = EXCLUDED.expires_at
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&link.code)
        .bind(&link.long_url)
        .bind(click_count)
        .bind(link.created_at)
        .bind(link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn record_click(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            UPDATE links
            SET click_count = click_count + 1
            WHERE code = $1 AND (expires_at IS NULL OR expires_at >= $2)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE expires_at < $1")
            .bind(before)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY created_at DESC, code"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}
