//! Application layer for multiturn-chat
//!
//! This crate contains the chat session use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SessionConfig;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle},
};
pub use use_cases::chat_session::{ChatSession, SessionError, SessionSnapshot};
