//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface over a
//! [`ChatSession`](multiturn_application::ChatSession).

mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::ChatRepl;
