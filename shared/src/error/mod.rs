//! Unified error codes for the fleet console
//!
//! - [`ErrorCode`]: numeric codes returned by the fleet API (ranges in [`codes`])
//! - [`ErrorCategory`]: the range a code falls in
//!
//! # Example
//!
//! ```
//! use shared::error::{ErrorCategory, ErrorCode};
//!
//! let code = ErrorCode::try_from(4001).unwrap();
//! assert_eq!(code, ErrorCode::ZoneNotFound);
//! assert_eq!(code.category(), ErrorCategory::Zone);
//! ```

mod category;
pub mod codes;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
