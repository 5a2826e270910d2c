//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Compiled regex for custom code validation.
static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"));

/// Upper bound on `expiration_hours`: ten years.
pub const MAX_EXPIRATION_HOURS: u32 = 24 * 365 * 10;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The target URL (absolute HTTP/HTTPS).
    #[validate(length(min = 1, max = 2048))]
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional custom short code.
    #[validate(length(min = 3, max = 64))]
    #[validate(regex(path = "*CUSTOM_CODE_REGEX"))]
    pub custom_code: Option<String>,

    /// Hours until the link expires; `0` or absent means never.
    #[validate(range(max = MAX_EXPIRATION_HOURS))]
    pub expiration_hours: Option<u32>,
}

/// Created short link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}
