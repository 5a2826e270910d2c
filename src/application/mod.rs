//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository and
//! cache calls, validation, and lifecycle rules. Services consume the
//! repository and cache traits and provide a clean API for HTTP handlers and
//! the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation, resolution and administration

pub mod services;
