//! Port for the structured conversation record.
//!
//! `tracing` carries diagnostics for humans; this port carries what was said
//! and what happened to each turn, for tools that replay or audit a chat.

use multiturn_domain::{MessageId, Model};
use serde::Serialize;

/// Something that happened to the conversation.
///
/// Serializes with a `type` tag (`user_message`, `model_response`, ...)
/// next to the event's own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A user turn was appended and sent.
    UserMessage {
        id: MessageId,
        model: Model,
        text: String,
    },
    /// The model reply for the pending turn was appended.
    ModelResponse {
        id: MessageId,
        model: Model,
        text: String,
    },
    /// The pending call failed; the user turn stays.
    RequestFailed { error: String },
    /// The pending call was cancelled and its partial reply dropped.
    RequestCancelled { discarded_bytes: usize },
    /// The transcript was cleared.
    SessionReset { cleared: usize },
}

impl ConversationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ConversationEvent::UserMessage { .. } => "user_message",
            ConversationEvent::ModelResponse { .. } => "model_response",
            ConversationEvent::RequestFailed { .. } => "request_failed",
            ConversationEvent::RequestCancelled { .. } => "request_cancelled",
            ConversationEvent::SessionReset { .. } => "session_reset",
        }
    }
}

/// Sink for [`ConversationEvent`]s. Never fails: a broken log must not
/// break the chat.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards every event.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
