//! Chat session domain.
//!
//! - [`entities::ChatMessage`] - a single turn within a transcript
//! - [`entities::MessageIdGenerator`] - hands out never-reused message ids
//! - [`stream::StreamEvent`] - one event of a streaming model response

pub mod entities;
pub mod stream;
