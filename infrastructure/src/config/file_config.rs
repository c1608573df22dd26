//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.
//!
//! ```toml
//! [provider]
//! model = "gemini-2.0-flash"
//! api_key_env = "GEMINI_API_KEY"
//! temperature = 0.7
//!
//! [session]
//! system_instruction = "You are a helpful assistant."
//! timeout_seconds = 120
//!
//! [repl]
//! show_progress = true
//!
//! [logging]
//! conversation_log = "~/.local/share/multiturn-chat/conversation.jsonl"
//! ```

use crate::gemini::gateway::{DEFAULT_BASE_URL, GeminiConfig};
use multiturn_application::SessionConfig;
use multiturn_domain::Model;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("max_output_tokens cannot be 0")]
    InvalidMaxOutputTokens,

    #[error("base_url cannot be empty")]
    EmptyBaseUrl,
}

/// Raw provider configuration from TOML
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Model to converse with
    pub model: Model,
    /// API key (prefer `api_key_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API base URL
    pub base_url: String,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Reply length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl std::fmt::Debug for FileProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProviderConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_env", &self.api_key_env)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl FileProviderConfig {
    /// The API key from the config file, falling back to `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Adapter configuration for the given key.
    pub fn to_gemini_config(&self, api_key: String) -> GeminiConfig {
        GeminiConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens)
    }
}

/// Raw session configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Instruction sent ahead of every transcript
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Cancel a reply still pending after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show the loading spinner
    pub show_progress: bool,
    /// Path to history file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation log path (disabled when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_log: Option<String>,
}

/// Complete configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: FileProviderConfig,
    pub session: FileSessionConfig,
    pub repl: FileReplConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.session.timeout_seconds == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if let Some(t) = self.provider.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigValidationError::InvalidTemperature(t));
        }
        if self.provider.max_output_tokens == Some(0) {
            return Err(ConfigValidationError::InvalidMaxOutputTokens);
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        Ok(())
    }

    /// Settings the chat session attaches to every request
    pub fn to_session_config(&self) -> SessionConfig {
        let config = SessionConfig::new(self.provider.model.clone());
        match &self.session.system_instruction {
            Some(instruction) => config.with_system_instruction(instruction.clone()),
            None => config,
        }
    }

    /// Render as TOML with secrets removed (for `--show-config`)
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut redacted = self.clone();
        if redacted.provider.api_key.is_some() {
            redacted.provider.api_key = Some("[REDACTED]".to_string());
        }
        toml::to_string_pretty(&redacted)
    }
}
