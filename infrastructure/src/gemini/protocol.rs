//! Gemini REST wire types.
//!
//! Only the subset of `generateContent` / `streamGenerateContent` used for
//! plain text conversations is modelled. Unknown fields are ignored.

use super::error::{GeminiError, Result};
use multiturn_domain::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Finish reasons under which a candidate carries no usable answer.
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Body of a `generateContent` / `streamGenerateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Build a request from a transcript, oldest turn first.
    pub fn from_transcript(
        messages: &[ChatMessage],
        system_instruction: Option<&str>,
        generation_config: GenerationConfig,
    ) -> Self {
        Self {
            contents: messages
                .iter()
                .map(|m| Content::text(Some(m.role), &m.text))
                .collect(),
            system_instruction: system_instruction.map(|s| Content::text(None, s)),
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<Role>, text: &str) -> Self {
        Self {
            role: role.map(|r| r.as_str().to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// A full response, or one SSE chunk of a streamed response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Text of this response, or `Blocked` when the prompt or the reply was
    /// refused.
    pub fn into_text(self) -> Result<String> {
        if let Some(reason) = self.block_reason() {
            return Err(GeminiError::Blocked(reason));
        }
        Ok(self.text())
    }

    /// A refused prompt has no candidates at all; a refused reply ends with a
    /// blocking finish reason and no text.
    fn block_reason(&self) -> Option<String> {
        let Some(candidate) = self.candidates.first() else {
            return self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone());
        };
        let reason = candidate.finish_reason.as_deref()?;
        (BLOCKING_FINISH_REASONS.contains(&reason) && self.text().is_empty())
            .then(|| reason.to_string())
    }
}

/// Parse one SSE `data:` payload into its text increment.
pub fn parse_stream_chunk(data: &str) -> Result<String> {
    let chunk: GenerateContentResponse = serde_json::from_str(data)?;
    chunk.into_text()
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Best human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
