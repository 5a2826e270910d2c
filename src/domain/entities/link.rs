//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// Maximum length of a target URL accepted by the storage layer.
pub const MAX_URL_LENGTH: usize = 2048;

/// A stored short link.
///
/// `code` is unique and never changes after creation. `click_count` only ever
/// grows. A link whose `expires_at` lies in the past is logically expired even
/// while the row is still physically present; the expiry sweeper removes it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub code: String,
    pub long_url: String,
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        code: String,
        long_url: String,
        click_count: u64,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code,
            long_url,
            click_count,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the link's expiry time lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e < now)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewLink {
    /// Builds the stored representation with a zero click count.
    pub fn into_link(self, created_at: DateTime<Utc>) -> Link {
        Link::new(self.code, self.long_url, 0, created_at, self.expires_at)
    }
}
