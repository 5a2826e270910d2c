//! DTOs for click analytics.

use serde::Serialize;

use crate::domain::entities::Link;

/// A link and its click count, as returned by the analytics endpoints.
#[derive(Debug, Serialize)]
pub struct LinkSummary {
    pub code: String,
    pub long_url: String,
    pub click_count: u64,
}

impl From<Link> for LinkSummary {
    fn from(link: Link) -> Self {
        Self {
            code: link.code,
            long_url: link.long_url,
            click_count: link.click_count,
        }
    }
}
