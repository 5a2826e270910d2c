//! Short code generation and validation utilities.
//!
//! Random codes are drawn uniformly from the 62-symbol alphanumeric alphabet.
//! Custom user-provided codes are checked against [`validate_custom_code`].

use std::sync::{LazyLock, Mutex};

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::json;

use crate::error::AppError;

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Minimum length of a custom code.
pub const MIN_CUSTOM_CODE_LENGTH: usize = 3;

/// Maximum length of any code; matches the storage column constraint.
pub const MAX_CODE_LENGTH: usize = 64;

static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"));

/// Generator of fixed-length random short codes.
///
/// The randomness source is owned by the generator instead of being a process
/// global, so tests can inject a seeded RNG via [`CodeGenerator::with_rng`].
/// The RNG lock is held only for the few microseconds it takes to draw a code.
pub struct CodeGenerator {
    length: usize,
    rng: Mutex<StdRng>,
}

impl CodeGenerator {
    /// Creates a generator seeded from the operating system.
    pub fn new(length: usize) -> Self {
        Self::with_rng(length, StdRng::from_os_rng())
    }

    /// Creates a generator using the provided RNG.
    pub fn with_rng(length: usize, rng: StdRng) -> Self {
        Self {
            length,
            rng: Mutex::new(rng),
        }
    }

    /// Length of every generated code.
    pub fn code_length(&self) -> usize {
        self.length
    }

    /// Generates a random code of [`Self::code_length`] alphanumeric characters.
    pub fn generate(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        (&mut *rng)
            .sample_iter(Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-64 characters
/// - Allowed characters: ASCII letters, digits, underscores and hyphens
///
/// Existence is not checked here; see
/// [`crate::application::services::LinkService::create`].
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_custom_code("valid_code-1").is_ok());
/// assert!(validate_custom_code("ab").is_err());        // Too short
/// assert!(validate_custom_code("has space").is_err()); // Bad character
/// ```
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if code.len() < MIN_CUSTOM_CODE_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom code must be at least {MIN_CUSTOM_CODE_LENGTH} characters"),
            json!({ "provided_length": code.len() }),
        ));
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom code must be at most {MAX_CODE_LENGTH} characters"),
            json!({ "provided_length": code.len() }),
        ));
    }

    if !CUSTOM_CODE_REGEX.is_match(code) {
        return Err(AppError::bad_request(
            "Custom code can only contain letters, digits, hyphens and underscores",
            json!({ "code": code }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_configured_length() {
        assert_eq!(CodeGenerator::default().generate().len(), 7);
        assert_eq!(CodeGenerator::new(12).generate().len(), 12);
    }

    #[test]
    fn test_generate_code_alphanumeric_only() {
        let generator = CodeGenerator::default();

        for _ in 0..200 {
            let code = generator.generate();
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let generator = CodeGenerator::default();
        let codes: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_seeded_generators_are_deterministic() {
        let a = CodeGenerator::with_rng(7, StdRng::seed_from_u64(42));
        let b = CodeGenerator::with_rng(7, StdRng::seed_from_u64(42));

        assert_eq!(a.generate(), b.generate());
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn test_generate_covers_whole_alphabet() {
        let generator = CodeGenerator::with_rng(7, StdRng::seed_from_u64(7));
        let seen: HashSet<char> = (0..2000).flat_map(|_| generator.generate().chars().collect::<Vec<_>>()).collect();

        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn test_validate_accepts_mixed_valid_chars() {
        assert!(validate_custom_code("valid_code-1").is_ok());
        assert!(validate_custom_code("abc").is_ok());
        assert!(validate_custom_code("MyCode").is_ok());
    }

    #[test]
    fn test_validate_too_short() {
        let err = validate_custom_code("ab").unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_validate_too_long() {
        let code = "a".repeat(MAX_CODE_LENGTH + 1);
        assert!(validate_custom_code(&code).is_err());
    }

    #[test]
    fn test_validate_spaces_not_allowed() {
        let err = validate_custom_code("has space").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_validate_special_characters() {
        assert!(validate_custom_code("my.code").is_err());
        assert!(validate_custom_code("code@123").is_err());
        assert!(validate_custom_code("słowo").is_err());
    }

    #[test]
    fn test_validate_empty_string() {
        assert!(validate_custom_code("").is_err());
    }
}
