//! Utility functions for code generation and request handling.
//!
//! - [`code_generator`] - Short code generation and custom code validation
//! - [`client_ip`] - Client identity extraction for rate limiting
//! - [`url_validator`] - Target URL checks

pub mod client_ip;
pub mod code_generator;
pub mod url_validator;
