//! Zone Model
//!
//! A zone is a named geofence drawn over the dispatch map. The JSON shape
//! used by the fleet API carries the shape kind in `type` and its data in a
//! sibling `geometry` object; [`Geometry`] maps that pair onto a single enum
//! so a circle can never carry polygon paths.

use serde::{Deserialize, Serialize};

use super::driver::DriverRef;
use crate::util::null_as_default;

/// Id prefix of zones drawn locally and not yet acknowledged by the server
pub const CLIENT_ZONE_PREFIX: &str = "custom";

/// Geographic point (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned lat/lng box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }
}

/// Zone owner kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerType {
    #[default]
    Company,
    User,
    /// Global read-only template, installable into a company's zone set
    Sublymus,
}

/// Shape kind, as sent in the zone's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Circle,
    Polygon,
    Rectangle,
}

impl ShapeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Polygon => "polygon",
            Self::Rectangle => "rectangle",
        }
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone geometry, one variant per [`ShapeType`]
///
/// Serialized adjacently tagged: `{"type": "circle", "geometry": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "geometry", rename_all = "lowercase")]
pub enum Geometry {
    Circle {
        center: LatLng,
        #[serde(rename = "radiusKm")]
        radius_km: f64,
    },
    Polygon {
        /// Closed ring; the last vertex connects back to the first
        paths: Vec<LatLng>,
    },
    Rectangle {
        bounds: Bounds,
    },
}

impl Geometry {
    pub fn circle(center: LatLng, radius_km: f64) -> Self {
        Self::Circle { center, radius_km }
    }

    pub fn polygon(paths: Vec<LatLng>) -> Self {
        Self::Polygon { paths }
    }

    pub fn rectangle(bounds: Bounds) -> Self {
        Self::Rectangle { bounds }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Circle { .. } => ShapeType::Circle,
            Self::Polygon { .. } => ShapeType::Polygon,
            Self::Rectangle { .. } => ShapeType::Rectangle,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Zone entity (配送区域)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub owner_type: OwnerType,
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Template this zone was installed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_zone_id: Option<String>,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Drivers whose active (ETP) zone is this one
    #[serde(default, deserialize_with = "null_as_default")]
    pub assigned_driver_ids: Vec<String>,
    /// Populated relation; some endpoints send this instead of the flat list
    #[serde(default, deserialize_with = "null_as_default", skip_serializing)]
    pub drivers: Vec<DriverRef>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            owner_type: OwnerType::Company,
            owner_id: None,
            source_zone_id: None,
            name: name.into(),
            color: "#3b82f6".to_string(),
            sector: None,
            geometry,
            assigned_driver_ids: Vec::new(),
            drivers: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_owner(mut self, owner_type: OwnerType, owner_id: Option<String>) -> Self {
        self.owner_type = owner_type;
        self.owner_id = owner_id;
        self
    }

    pub fn shape_type(&self) -> ShapeType {
        self.geometry.shape_type()
    }

    /// Global read-only template
    pub fn is_template(&self) -> bool {
        self.owner_type == OwnerType::Sublymus
    }

    /// Drawn locally and never acknowledged with a canonical id
    pub fn is_client_scoped(&self) -> bool {
        self.id.starts_with(CLIENT_ZONE_PREFIX)
    }

    pub fn has_driver(&self, driver_id: &str) -> bool {
        self.assigned_driver_ids.iter().any(|d| d == driver_id)
    }

    /// Returns false if the driver was already assigned
    pub fn assign_driver(&mut self, driver_id: &str) -> bool {
        if self.has_driver(driver_id) {
            return false;
        }
        self.assigned_driver_ids.push(driver_id.to_string());
        true
    }

    /// Returns false if the driver was not assigned
    pub fn unassign_driver(&mut self, driver_id: &str) -> bool {
        let before = self.assigned_driver_ids.len();
        self.assigned_driver_ids.retain(|d| d != driver_id);
        before != self.assigned_driver_ids.len()
    }

    /// Fold the populated `drivers` relation into `assigned_driver_ids`
    /// when the server did not echo the flat list.
    pub fn normalize_assignments(&mut self) {
        if self.assigned_driver_ids.is_empty() && !self.drivers.is_empty() {
            self.assigned_driver_ids = self.drivers.iter().map(|d| d.id.clone()).collect();
        }
        self.drivers.clear();
    }

    /// Create payload for this zone (id is server-assigned)
    pub fn to_create(&self) -> ZoneCreate {
        ZoneCreate {
            name: self.name.clone(),
            color: self.color.clone(),
            sector: self.sector.clone(),
            geometry: self.geometry.clone(),
            is_active: self.is_active,
        }
    }
}

/// Create zone payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCreate {
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub is_active: bool,
}

/// Update zone payload (partial zone)
///
/// Unset fields are left untouched by the server. An empty `sector` clears
/// the grouping label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub geometry: Option<Geometry>,
}

impl ZonePatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    pub fn sector(sector: impl Into<String>) -> Self {
        Self {
            sector: Some(sector.into()),
            ..Default::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.sector.is_none()
            && self.is_active.is_none()
            && self.geometry.is_none()
    }

    /// Merge a later patch into this one; fields set by `later` win.
    pub fn merge(&mut self, later: ZonePatch) {
        if later.name.is_some() {
            self.name = later.name;
        }
        if later.color.is_some() {
            self.color = later.color;
        }
        if later.sector.is_some() {
            self.sector = later.sector;
        }
        if later.is_active.is_some() {
            self.is_active = later.is_active;
        }
        if later.geometry.is_some() {
            self.geometry = later.geometry;
        }
    }

    pub fn apply_to(&self, zone: &mut Zone) {
        if let Some(name) = &self.name {
            zone.name = name.clone();
        }
        if let Some(color) = &self.color {
            zone.color = color.clone();
        }
        if let Some(sector) = &self.sector {
            zone.sector = if sector.is_empty() {
                None
            } else {
                Some(sector.clone())
            };
        }
        if let Some(is_active) = self.is_active {
            zone.is_active = is_active;
        }
        if let Some(geometry) = &self.geometry {
            zone.geometry = geometry.clone();
        }
    }
}

/// Response of the template install endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResponse {
    pub zone: Zone,
    pub source_zone: Zone,
}
