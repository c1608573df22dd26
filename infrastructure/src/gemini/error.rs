//! Error types for the Gemini adapter

use multiturn_application::GatewayError;
use thiserror::Error;

/// Result type alias for Gemini operations
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Errors that can occur when talking to the Gemini API
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Response blocked by the provider ({0})")]
    Blocked(String),

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("No API key configured")]
    MissingApiKey,
}

impl From<GeminiError> for GatewayError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::Http(e) if e.is_timeout() => GatewayError::Timeout,
            GeminiError::Http(e) if e.is_connect() => GatewayError::ConnectionError(e.to_string()),
            GeminiError::RateLimited => GatewayError::RateLimited,
            GeminiError::Serialization(e) => GatewayError::InvalidResponse(e.to_string()),
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_gateway_rate_limit() {
        assert_eq!(
            GatewayError::from(GeminiError::RateLimited),
            GatewayError::RateLimited
        );
    }

    #[test]
    fn api_error_keeps_status_and_message() {
        let error = GatewayError::from(GeminiError::Api {
            status: 400,
            message: "API key not valid".to_string(),
        });
        assert_eq!(
            error,
            GatewayError::RequestFailed("API error (HTTP 400): API key not valid".to_string())
        );
    }

    #[test]
    fn blocked_reply_is_a_request_failure() {
        assert_eq!(
            GatewayError::from(GeminiError::Blocked("SAFETY".to_string())),
            GatewayError::RequestFailed("Response blocked by the provider (SAFETY)".to_string())
        );
    }

    #[test]
    fn bad_json_maps_to_invalid_response() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            GatewayError::from(GeminiError::from(json_error)),
            GatewayError::InvalidResponse(_)
        ));
    }
}
