//! Infrastructure layer for multiturn-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gemini;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileProviderConfig,
    FileReplConfig, FileSessionConfig,
};
pub use gemini::{
    error::{GeminiError, Result},
    gateway::{GeminiConfig, GeminiLlmGateway},
};
pub use logging::JsonlConversationLogger;
