//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A short code mapped to a target URL with its click counter
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with a separate struct for creation:
//! [`NewLink`] carries only the fields a caller supplies, while [`Link`] is the
//! stored record as read back from a repository.

pub mod link;

pub use link::{Link, MAX_URL_LENGTH, NewLink};
