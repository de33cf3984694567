//! Error types for tether.

pub mod unified;

pub use unified::{ErrorCategory, PlatformErrorBody};

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all tether operations.
#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Operation canceled")]
    Canceled,
}

impl TetherError {
    /// Create an API error without a platform error code.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Canceled => ErrorCategory::Canceled,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

impl From<AuthError> for TetherError {
    fn from(error: AuthError) -> Self {
        TetherError::Authentication(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TetherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(TetherError::api(401, "no").category(), ErrorCategory::Authentication);
        assert_eq!(TetherError::api(404, "gone").category(), ErrorCategory::NotFound);
        assert_eq!(TetherError::api(429, "slow").category(), ErrorCategory::RateLimit);
        assert_eq!(TetherError::api(503, "down").category(), ErrorCategory::Server);
        assert_eq!(TetherError::api(400, "bad").category(), ErrorCategory::Api);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(TetherError::Timeout(500).is_retryable());
        assert!(TetherError::api(502, "bad gateway").is_retryable());
        assert!(!TetherError::Canceled.is_retryable());
        assert!(!TetherError::Configuration("missing".into()).is_retryable());
    }

    #[test]
    fn auth_errors_become_authentication() {
        let err: TetherError = AuthError::InvalidResponse("no token".into()).into();
        assert!(matches!(err, TetherError::Authentication(ref m) if m.contains("no token")));
    }
}
