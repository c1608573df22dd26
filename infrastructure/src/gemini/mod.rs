//! Gemini API adapter
//!
//! Implements LlmGateway over the Generative Language REST API, with
//! streaming replies delivered as Server-Sent Events.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sse;
