//! Geometry Library
//!
//! Pure containment and camera helpers over [`Geometry`]. Distances use the
//! haversine formula on a sphere of radius 6 378 137 m, the same model the
//! map widget uses for its spherical distance, so a point drawn on a circle's
//! edge resolves the same way here and on screen.

use shared::{Bounds, Geometry, LatLng};

/// Sphere radius used for great-circle distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Approximate kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

pub const MIN_ZOOM: u8 = 10;
pub const MAX_ZOOM: u8 = 18;
/// Zoom used when focusing a polygon or rectangle
pub const SHAPE_FOCUS_ZOOM: u8 = 14;
/// Zoom used when following a driver
pub const DRIVER_FOCUS_ZOOM: u8 = 16;

/// Where the map camera should move to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub center: LatLng,
    pub zoom: u8,
}

impl CameraTarget {
    pub const fn new(center: LatLng, zoom: u8) -> Self {
        Self { center, zoom }
    }
}

/// Great-circle distance in meters
pub fn haversine_meters(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn contains_circle(point: LatLng, center: LatLng, radius_km: f64) -> bool {
    haversine_meters(point, center) <= radius_km * 1000.0
}

/// Ray casting over a closed ring. Fewer than three vertices contain nothing.
pub fn contains_polygon(point: LatLng, paths: &[LatLng]) -> bool {
    if paths.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = paths.len() - 1;
    for (i, vi) in paths.iter().enumerate() {
        let vj = paths[j];
        let (xi, yi) = (vi.lng, vi.lat);
        let (xj, yj) = (vj.lng, vj.lat);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Inclusive on all four edges
pub fn contains_rectangle(point: LatLng, bounds: &Bounds) -> bool {
    bounds.south <= point.lat
        && point.lat <= bounds.north
        && bounds.west <= point.lng
        && point.lng <= bounds.east
}

pub fn contains(geometry: &Geometry, point: LatLng) -> bool {
    match geometry {
        Geometry::Circle { center, radius_km } => contains_circle(point, *center, *radius_km),
        Geometry::Polygon { paths } => contains_polygon(point, paths),
        Geometry::Rectangle { bounds } => contains_rectangle(point, bounds),
    }
}

/// Circle center, mean of polygon vertices, or rectangle midpoint.
///
/// `None` for a polygon without vertices.
pub fn centroid(geometry: &Geometry) -> Option<LatLng> {
    match geometry {
        Geometry::Circle { center, .. } => Some(*center),
        Geometry::Polygon { paths } => {
            if paths.is_empty() {
                return None;
            }
            let n = paths.len() as f64;
            let (lat, lng) = paths
                .iter()
                .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
            Some(LatLng::new(lat / n, lng / n))
        }
        Geometry::Rectangle { bounds } => Some(LatLng::new(
            (bounds.north + bounds.south) / 2.0,
            (bounds.east + bounds.west) / 2.0,
        )),
    }
}

/// `clamp(round(14 - log2(radius_km)), 10, 18)`
pub fn zoom_for_radius(radius_km: f64) -> u8 {
    // log2 of a non-positive radius is -inf/NaN; treat it as "tiny"
    if radius_km.is_nan() || radius_km <= 0.0 {
        return MAX_ZOOM;
    }
    let zoom = (14.0 - radius_km.log2()).round();
    zoom.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

/// Six vertices every 60°, starting due east of `center`
pub fn regular_hexagon(center: LatLng, radius_km: f64) -> Vec<LatLng> {
    let lat_step = radius_km / KM_PER_DEGREE;
    let lng_step = radius_km / (KM_PER_DEGREE * center.lat.to_radians().cos());

    (0..6)
        .map(|i| {
            let theta = (60.0 * i as f64).to_radians();
            LatLng::new(
                center.lat + lat_step * theta.sin(),
                center.lng + lng_step * theta.cos(),
            )
        })
        .collect()
}

/// Camera target for focusing a zone
pub fn focus_for(geometry: &Geometry) -> Option<CameraTarget> {
    match geometry {
        Geometry::Circle { center, radius_km } => {
            Some(CameraTarget::new(*center, zoom_for_radius(*radius_km)))
        }
        _ => centroid(geometry).map(|c| CameraTarget::new(c, SHAPE_FOCUS_ZOOM)),
    }
}
