//! Application-level configuration.
//!
//! - [`SessionConfig`]: what a [`ChatSession`](crate::ChatSession) sends
//!   along with every request (model, system instruction)

pub mod session_config;

pub use session_config::SessionConfig;
