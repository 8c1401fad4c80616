//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A tool definition was rejected before any request was sent
    #[error("Invalid tool '{name}': {reason}")]
    InvalidTool { name: String, reason: String },

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Convert LLMError to crew_core::Error
///
/// Tool rejections surface as build errors; everything else happens while a
/// task is executing.
impl From<LLMError> for crew_core::Error {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::InvalidTool { .. } => crew_core::Error::Build(err.to_string()),
            other => crew_core::Error::Processing(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;

    #[test]
    fn test_invalid_tool_maps_to_build() {
        let err: crew_core::Error = LLMError::InvalidTool {
            name: "bad tool".into(),
            reason: "invalid name".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[test]
    fn test_request_failure_maps_to_processing() {
        let err: crew_core::Error = LLMError::RateLimitExceeded("slow down".into()).into();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(err.to_string().contains("slow down"));
    }
}
