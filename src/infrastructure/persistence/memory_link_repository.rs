//! In-process link repository backed by a sharded concurrent map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Link repository that keeps everything in memory.
///
/// Each operation locks only the shard owning the code for the duration of a
/// synchronous map access, which gives per-code atomicity (conflict detection
/// on insert, lost-update-free click increments) without serializing
/// unrelated codes. Data does not survive a restart; intended for tests and
/// local development.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: DashMap<String, Link>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links, expired ones included.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        match self.links.entry(new_link.code.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "Short code already exists",
                json!({ "code": new_link.code }),
            )),
            Entry::Vacant(slot) => {
                let link = new_link.into_link(Utc::now());
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.links.get(code).map(|entry| entry.value().clone()))
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.links.contains_key(code))
    }

    async fn save(&self, link: Link) -> Result<Link, AppError> {
        match self.links.entry(link.code.clone()) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                stored.long_url = link.long_url;
                stored.expires_at = link.expires_at;
                stored.click_count = stored.click_count.max(link.click_count);
                Ok(stored.clone())
            }
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn record_click(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let Some(mut entry) = self.links.get_mut(code) else {
            return Ok(None);
        };

        if entry.is_expired_at(now) {
            return Ok(None);
        }

        entry.click_count += 1;
        Ok(Some(entry.value().clone()))
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let mut deleted = 0u64;

        self.links.retain(|_, link| {
            let expired = link.is_expired_at(before);
            if expired {
                deleted += 1;
            }
            !expired
        });

        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self
            .links
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });

        Ok(links)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
