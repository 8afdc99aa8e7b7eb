//! Numeric error codes returned in the fleet API's `{code, message}` bodies
//!
//! Ranges:
//! - 0xxx: request level
//! - 1xxx: authentication
//! - 2xxx: permission
//! - 4xxx: zone
//! - 5xxx: driver assignment (ETP)
//! - 6xxx: template
//! - 9xxx: transport / server

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried as a bare `u16` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: Request ====================
    InvalidRequest = 1,
    ValidationFailed = 2,
    NotFound = 3,

    // ==================== 1xxx: Auth ====================
    NotAuthenticated = 1001,
    /// Console session is no longer valid, log in again
    SessionExpired = 1002,

    // ==================== 2xxx: Permission ====================
    PermissionDenied = 2001,
    /// Sublymus (global) zones cannot be changed by a company
    TemplateReadOnly = 2002,

    // ==================== 4xxx: Zone ====================
    ZoneNotFound = 4001,
    /// Geometry does not match its shape type or violates shape bounds
    ZoneGeometryInvalid = 4002,
    ZoneNameRequired = 4003,

    // ==================== 5xxx: Assignment ====================
    DriverNotFound = 5001,
    /// Driver is not in ETP (company-managed) mode
    DriverNotEtp = 5002,
    AssignmentFailed = 5003,

    // ==================== 6xxx: Template ====================
    TemplateNotFound = 6001,
    TemplateAlreadyInstalled = 6002,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    NetworkError = 9003,
    TimeoutError = 9004,
}

impl ErrorCode {
    /// Every code, in table order
    pub const ALL: [ErrorCode; 18] = [
        Self::InvalidRequest,
        Self::ValidationFailed,
        Self::NotFound,
        Self::NotAuthenticated,
        Self::SessionExpired,
        Self::PermissionDenied,
        Self::TemplateReadOnly,
        Self::ZoneNotFound,
        Self::ZoneGeometryInvalid,
        Self::ZoneNameRequired,
        Self::DriverNotFound,
        Self::DriverNotEtp,
        Self::AssignmentFailed,
        Self::TemplateNotFound,
        Self::TemplateAlreadyInstalled,
        Self::InternalError,
        Self::NetworkError,
        Self::TimeoutError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default text shown to the operator when the server sends none
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request could not be understood",
            Self::ValidationFailed => "Some fields are invalid",
            Self::NotFound => "Nothing found at this address",
            Self::NotAuthenticated => "Please log in",
            Self::SessionExpired => "Session expired, please log in again",
            Self::PermissionDenied => "You are not allowed to do this",
            Self::TemplateReadOnly => "Template zones are read-only",
            Self::ZoneNotFound => "Zone not found",
            Self::ZoneGeometryInvalid => "Zone shape is invalid",
            Self::ZoneNameRequired => "Zone name is required",
            Self::DriverNotFound => "Driver not found",
            Self::DriverNotEtp => "Driver is not managed by the company",
            Self::AssignmentFailed => "Could not change the driver's active zone",
            Self::TemplateNotFound => "Template zone not found",
            Self::TemplateAlreadyInstalled => "Template already installed",
            Self::InternalError => "Server error",
            Self::NetworkError => "Fleet API unreachable",
            Self::TimeoutError => "Fleet API did not answer in time",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` outside the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trips_through_u16() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::ZoneGeometryInvalid));
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ZoneNotFound).unwrap();
        assert_eq!(json, "4001");

        let code: ErrorCode = serde_json::from_str("5003").unwrap();
        assert_eq!(code, ErrorCode::AssignmentFailed);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }
}
