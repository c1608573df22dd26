//! Per-session request settings.

use multiturn_domain::Model;

/// Settings a chat session attaches to every model request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Model the conversation is held with.
    pub model: Model,
    /// Optional instruction sent ahead of the transcript.
    pub system_instruction: Option<String>,
}

impl SessionConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            system_instruction: None,
        }
    }

    /// Set the system instruction. Blank instructions are dropped.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.system_instruction = if instruction.trim().is_empty() {
            None
        } else {
            Some(instruction)
        };
        self
    }
}
