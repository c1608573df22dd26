//! LLM Gateway port
//!
//! Defines the interface for communicating with a generative model API.

use async_trait::async_trait;
use multiturn_domain::{ChatMessage, Model, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// A single model call: the role-tagged transcript plus per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: Model,
    pub system_instruction: Option<String>,
    /// Full transcript, oldest first, ending with the newest user turn.
    pub messages: Vec<ChatMessage>,
}

/// Handle for receiving streaming events from a model call.
///
/// Dropping the handle tells the producer that nobody is listening anymore,
/// which is how an in-flight call is released on cancellation.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Wrap an already complete response as a one-event stream.
    pub fn completed(text: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 with a fresh receiver, the send cannot fail
        let _ = tx.try_send(StreamEvent::Completed(text.into()));
        Self::new(rx)
    }
}

/// Gateway for model communication
///
/// This port defines how the application layer talks to a model provider.
/// Implementations (adapters) live in the infrastructure layer. Retry policy,
/// if any, belongs to the adapter.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send the transcript and wait for the complete reply.
    async fn send(&self, request: &ChatRequest) -> Result<String, GatewayError>;

    /// Send the transcript and get a streaming reply.
    ///
    /// Default implementation calls `send()` and wraps the result in a single
    /// `Completed` event, so non-streaming adapters work without changes.
    async fn send_streaming(&self, request: &ChatRequest) -> Result<StreamHandle, GatewayError> {
        let text = self.send(request).await?;
        Ok(StreamHandle::completed(text))
    }

    /// Get available models
    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        Ok(Model::known_models())
    }
}
