//! Domain layer for multiturn-chat
//!
//! This crate contains the core entities and value objects of a multi-turn
//! chat conversation. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! - **Turn**: one [`ChatMessage`] authored by either the user or the model
//! - **Transcript**: the ordered, append-only history of turns
//! - **Streaming increment**: a [`StreamEvent::Delta`] fragment of a model
//!   response delivered before the response is complete

pub mod core;
pub mod session;

// Re-export commonly used types
pub use core::{error::DomainError, model::Model};
pub use session::{
    entities::{ChatMessage, MessageId, MessageIdGenerator, Role, validate_user_text},
    stream::StreamEvent,
};
