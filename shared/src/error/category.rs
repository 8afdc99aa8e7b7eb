//! Error code ranges

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the fleet API an error code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Request,
    Auth,
    Permission,
    Zone,
    Assignment,
    Template,
    /// 9xxx and every unassigned range
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::Request,
            1 => Self::Auth,
            2 => Self::Permission,
            4 => Self::Zone,
            5 => Self::Assignment,
            6 => Self::Template,
            _ => Self::System,
        }
    }

    /// Session-level failures: the operator has to log in again
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::Auth)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Zone => "zone",
            Self::Assignment => "assignment",
            Self::Template => "template",
            Self::System => "system",
        })
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
