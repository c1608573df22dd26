//! Streaming events for model responses.
//!
//! [`StreamEvent`] represents individual events in a streaming model
//! response, enabling real-time display of output as it is generated.

/// An event in a streaming model response.
///
/// Used to bridge infrastructure-level streaming (e.g. SSE chunks from an
/// HTTP API) to the application layer. A well-formed stream is zero or more
/// `Delta` events followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}
