//! Client error types

use shared::ErrorCode;
use thiserror::Error;

/// Errors from the fleet API collaborator
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-2xx answer without a structured body
    #[error("Server error: {0}")]
    Internal(String),

    /// Response body did not match the expected model
    #[error("Malformed payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Structured error returned by the fleet API
    #[error("API error {code}: {message}")]
    Api { code: ErrorCode, message: String },

    /// Backend refused the call (offline, injected failure)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Best-effort mapping onto the shared error code table
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => *code,
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(_) | Self::Unavailable(_) => ErrorCode::NetworkError,
            Self::Serialization(_) => ErrorCode::InvalidRequest,
            Self::Unauthorized => ErrorCode::NotAuthenticated,
            Self::Forbidden(_) => ErrorCode::PermissionDenied,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        let api = ClientError::Api {
            code: ErrorCode::TemplateNotFound,
            message: "gone".into(),
        };
        assert_eq!(api.code(), ErrorCode::TemplateNotFound);
        assert_eq!(ClientError::Unavailable("x".into()).code(), ErrorCode::NetworkError);
        assert_eq!(ClientError::Unauthorized.code(), ErrorCode::NotAuthenticated);
        assert_eq!(ClientError::Validation("bad".into()).code(), ErrorCode::ValidationFailed);
    }
}
