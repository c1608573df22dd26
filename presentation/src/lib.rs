//! Presentation layer for multiturn-chat
//!
//! This crate contains the CLI definition, output formatting, the loading
//! indicator, and the interactive chat REPL. It observes a
//! [`ChatSession`](multiturn_application::ChatSession) and invokes its
//! operations; it never mutates conversation state itself.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use config::ReplConfig;
pub use output::console::ConsoleFormatter;
pub use progress::reply::ReplyProgress;
