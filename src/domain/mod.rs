//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces, and background domain tasks
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`expiry_sweeper`] - Periodic removal of expired links
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod expiry_sweeper;
pub mod repositories;
