//! Gemini LLM Gateway implementation

use crate::gemini::error::{GeminiError, Result};
use crate::gemini::protocol::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, error_message,
    parse_stream_chunk,
};
use crate::gemini::sse::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use multiturn_application::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use multiturn_domain::{Model, StreamEvent};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Buffered stream events between the reader task and the session.
const STREAM_BUFFER: usize = 64;

/// Gemini API client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_output_tokens: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// LLM Gateway implementation for the Gemini REST API
pub struct GeminiLlmGateway {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiLlmGateway {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        // No overall request timeout: streamed replies may legitimately run
        // long, and callers bound them by cancelling.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        info!("GeminiLlmGateway initialized ({})", config.base_url);
        Ok(Self { config, http })
    }

    fn endpoint(&self, model: &Model, stream: bool) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if stream {
            format!("{}/models/{}:streamGenerateContent?alt=sse", base, model)
        } else {
            format!("{}/models/{}:generateContent", base, model)
        }
    }

    fn body(&self, request: &ChatRequest) -> GenerateContentRequest {
        GenerateContentRequest::from_transcript(
            &request.messages,
            request.system_instruction.as_deref(),
            GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        )
    }

    async fn post(&self, url: &str, body: &GenerateContentRequest) -> Result<reqwest::Response> {
        debug!("POST {} ({} turns)", url, body.contents.len());

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeminiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmGateway for GeminiLlmGateway {
    async fn send(&self, request: &ChatRequest) -> std::result::Result<String, GatewayError> {
        let url = self.endpoint(&request.model, false);
        let response = self.post(&url, &self.body(request)).await?;
        let parsed: GenerateContentResponse = response.json().await.map_err(GeminiError::from)?;
        let text = parsed.into_text()?;
        if text.is_empty() {
            return Err(GeminiError::EmptyReply.into());
        }
        Ok(text)
    }

    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> std::result::Result<StreamHandle, GatewayError> {
        let url = self.endpoint(&request.model, true);
        let response = self.post(&url, &self.body(request)).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump_sse(response, tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Read the SSE body and forward text increments until the stream ends or
/// the receiving side goes away.
async fn pump_sse(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let mut lines = tokio::io::BufReader::new(StreamReader::new(byte_stream)).lines();
    let mut decoder = SseDecoder::new();
    let mut full_text = String::new();

    loop {
        let line = tokio::select! {
            _ = tx.closed() => {
                debug!("Stream receiver dropped; releasing response");
                return;
            }
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                if let Some(data) = decoder.push_line(&line)
                    && !forward_chunk(&tx, &data, &mut full_text).await
                {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Gemini stream read failed: {}", e);
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        }
    }

    if let Some(data) = decoder.finish()
        && !forward_chunk(&tx, &data, &mut full_text).await
    {
        return;
    }

    // An empty model turn would be rejected when sent back as context
    if full_text.is_empty() {
        warn!("Gemini stream ended without any text");
        let _ = tx
            .send(StreamEvent::Error(GeminiError::EmptyReply.to_string()))
            .await;
        return;
    }

    debug!("Gemini stream finished ({} bytes)", full_text.len());
    let _ = tx.send(StreamEvent::Completed(full_text)).await;
}

/// Returns false when streaming must stop.
async fn forward_chunk(tx: &mpsc::Sender<StreamEvent>, data: &str, full_text: &mut String) -> bool {
    match parse_stream_chunk(data) {
        Ok(chunk) if chunk.is_empty() => true,
        Ok(chunk) => {
            full_text.push_str(&chunk);
            tx.send(StreamEvent::Delta(chunk)).await.is_ok()
        }
        Err(e) => {
            warn!("Bad Gemini stream chunk: {}", e);
            let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            false
        }
    }
}
