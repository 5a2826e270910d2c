//! Target URL validation.
//!
//! Targets are stored exactly as submitted; this module only decides whether
//! a submitted string is acceptable.

use url::Url;

use crate::domain::entities::MAX_URL_LENGTH;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL exceeds {max} characters")]
    TooLong { max: usize },

    #[error("URL must not contain whitespace or control characters")]
    UnsafeCharacter,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is an absolute `http`/`https` URL of acceptable length.
///
/// Rejects dangerous schemes such as `javascript:`, `data:` and `file:`.
/// Whitespace and control characters are rejected outright: the URL parser
/// would silently drop them, yet the stored string is later sent verbatim as a
/// `Location` header.
///
/// # Errors
///
/// Returns the first [`UrlValidationError`] that applies.
pub fn validate_long_url(input: &str) -> Result<(), UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::Empty);
    }

    if input.chars().count() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong {
            max: MAX_URL_LENGTH,
        });
    }

    if input
        .chars()
        .any(|c| c.is_control() || c.is_whitespace())
    {
        return Err(UrlValidationError::UnsafeCharacter);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}
