use parley_core::error::Error as CoreError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {provider} - {message}")]
    Api { provider: String, message: String },

    #[error("Rate limited: {provider}, retry after {retry_after_ms:?}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("Missing API key for {provider}: set {env_var} or pass an explicit key")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown model '{0}': pass model info explicitly to use it")]
    ModelNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;

impl LlmError {
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_ms,
        }
    }

    pub fn missing_api_key(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Timeout(_) | LlmError::Network(_)
        )
    }

    /// Raised before any request was sent: bad credentials, unknown
    /// models, unsupported features.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::MissingApiKey { .. }
                | LlmError::ModelNotFound(_)
                | LlmError::AuthenticationFailed(_)
                | LlmError::Config(_)
                | LlmError::InvalidRequest(_)
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited {
                retry_after_ms: Some(ms),
                ..
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(LlmError::rate_limited("deepseek", None).is_retryable());
        assert!(LlmError::Timeout(1000).is_retryable());
        assert!(LlmError::network("reset").is_retryable());
        assert!(!LlmError::api("deepseek", "400").is_retryable());
        assert!(!LlmError::missing_api_key("deepseek", "DEEPSEEK_API_KEY").is_retryable());
    }

    #[test]
    fn test_missing_key_message_names_variable() {
        let err = LlmError::missing_api_key("deepseek", "DEEPSEEK_API_KEY");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn test_retry_after() {
        let err = LlmError::rate_limited("openai", Some(1500));
        assert_eq!(err.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(LlmError::Timeout(5).retry_after(), None);
    }
}
