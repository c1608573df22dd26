//! Session domain entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Author of a turn in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a [`ChatMessage`] (Value Object)
///
/// Ids only address and order messages. They are assigned at creation and
/// are never handed out twice by the same [`MessageIdGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Monotonic source of [`MessageId`]s.
///
/// A generator outlives transcript resets so ids stay unique for the whole
/// lifetime of a session.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    next: u64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> MessageId {
        self.next += 1;
        MessageId(self.next)
    }
}

/// A single turn in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Validate text a user wants to submit.
///
/// Blank input (empty or whitespace only) is rejected. The text itself is
/// returned unchanged; trimming only decides validity.
pub fn validate_user_text(text: &str) -> Result<&str, DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::EmptyInput);
    }
    Ok(text)
}
