//! Driver Model

use serde::{Deserialize, Serialize};

/// Driver entity (only `id` is consumed by the zone engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// ONLINE | OFFLINE | BUSY ...
    #[serde(default)]
    pub status: Option<String>,
}

impl Driver {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            phone: None,
            status: None,
        }
    }
}

/// Live position of a driver, refreshed by polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPosition {
    pub driver_id: String,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Degrees clockwise from north
    #[serde(default)]
    pub heading: f64,
    /// km/h
    #[serde(default)]
    pub speed: f64,
}

/// Populated driver relation as returned on a zone (`drivers: [{ id }]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRef {
    pub id: String,
}
