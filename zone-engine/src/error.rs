//! Engine error types

use fleet_client::ClientError;
use shared::ErrorCode;
use thiserror::Error;

/// Zone engine error
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// An edit arrived while no zone is selected for editing
    #[error("No zone is being edited")]
    NotEditing,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Backend(#[from] ClientError),

    /// View state persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ZoneNotFound(_) => ErrorCode::ZoneNotFound,
            Self::NotEditing | Self::InvalidState(_) => ErrorCode::InvalidRequest,
            Self::Backend(e) => e.code(),
            Self::Storage(_) => ErrorCode::InternalError,
            Self::Serialization(_) => ErrorCode::InvalidRequest,
        }
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_code() {
        let err: EngineError = ClientError::Api {
            code: ErrorCode::TemplateNotFound,
            message: "gone".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::TemplateNotFound);
        assert_eq!(err.to_string(), ClientError::Api {
            code: ErrorCode::TemplateNotFound,
            message: "gone".into(),
        }
        .to_string());
    }

    #[test]
    fn test_zone_not_found_code() {
        assert_eq!(
            EngineError::ZoneNotFound("Z1".into()).code(),
            ErrorCode::ZoneNotFound
        );
    }
}
