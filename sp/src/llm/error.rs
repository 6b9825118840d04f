//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to the completion service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by completion service, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed completion payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Missing or rejected credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::MissingApiKey(_) | Self::ApiError { status: 401 | 403, .. })
    }

    /// Transient failure: worth sending the same request again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { status, .. } => *status == 408 || *status >= 500,
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::InvalidResponse(_) | Self::MissingApiKey(_) | Self::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(err.is_rate_limit());

        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_is_auth() {
        assert!(LlmError::MissingApiKey("OPENAI_API_KEY".to_string()).is_auth());
        assert!(
            LlmError::ApiError {
                status: 401,
                message: "bad key".to_string()
            }
            .is_auth()
        );
        assert!(!LlmError::InvalidResponse("nope".to_string()).is_auth());
    }

    #[test]
    fn test_is_retryable() {
        assert!(
            LlmError::ApiError {
                status: 502,
                message: "Bad gateway".to_string()
            }
            .is_retryable()
        );

        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_retryable()
        );

        assert!(LlmError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!LlmError::MissingApiKey("X".to_string()).is_retryable());
    }

    #[test]
    fn test_missing_api_key_message_names_variable() {
        let msg = LlmError::MissingApiKey("OPENAI_API_KEY".to_string()).to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
    }
}
