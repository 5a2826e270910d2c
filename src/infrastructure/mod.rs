//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and rate limiting.
//!
//! # Modules
//!
//! - [`cache`] - Cache-aside backends (Redis, in-process, no-op)
//! - [`persistence`] - Link repository implementations
//! - [`rate_limit`] - Fixed-window rate limiters (Redis, in-process)

pub mod cache;
pub mod persistence;
pub mod rate_limit;
