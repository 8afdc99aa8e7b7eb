//! Data models
//!
//! Shared between the fleet API client and the zone engine.
//! Field names follow the API's camelCase JSON.

pub mod driver;
pub mod zone;

// Re-exports
pub use driver::*;
pub use zone::*;
