//! Shared types for the fleet console
//!
//! Domain models exchanged with the fleet API (zones, drivers, positions),
//! the unified error code table, and small utilities used by both the
//! client crate and the zone engine.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ErrorCategory, ErrorCode, InvalidErrorCode};
pub use models::{
    Bounds, Driver, DriverPosition, DriverRef, Geometry, InstallResponse, LatLng, OwnerType,
    ShapeType, Zone, ZoneCreate, ZonePatch,
};
