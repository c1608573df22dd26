//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`] - available generative models
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod model;
