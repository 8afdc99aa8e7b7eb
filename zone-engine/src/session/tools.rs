//! Drawing tools and the defaults they stamp on new zones

use shared::{Geometry, ShapeType, Zone};

/// Drawing tool picked in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawingTool {
    Circle,
    Polygon,
    Rectangle,
    /// Two-click preset producing a regular hexagon, stored as a polygon
    Hexagon,
}

impl DrawingTool {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Circle => "custom-circle",
            Self::Polygon => "custom-poly",
            Self::Rectangle => "custom-rect",
            Self::Hexagon => "custom-hex",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            Self::Circle => "#10b981",
            Self::Polygon => "#3b82f6",
            Self::Rectangle => "#8b5cf6",
            Self::Hexagon => "#f59e0b",
        }
    }

    pub fn default_name(&self, ordinal: usize) -> String {
        match self {
            Self::Hexagon => format!("Hexagone {}", ordinal),
            _ => format!("Zone {}", ordinal),
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Circle => ShapeType::Circle,
            Self::Polygon | Self::Hexagon => ShapeType::Polygon,
            Self::Rectangle => ShapeType::Rectangle,
        }
    }

    /// Build the optimistic zone for a finished shape.
    ///
    /// `ordinal` is the client-scoped count plus one, `stamp` a millisecond
    /// timestamp making the client id unique.
    pub fn build_zone(&self, geometry: Geometry, ordinal: usize, stamp: i64) -> Zone {
        Zone::new(
            format!("{}-{}", self.id_prefix(), stamp),
            self.default_name(ordinal),
            geometry,
        )
        .with_color(self.default_color())
    }
}

impl From<ShapeType> for DrawingTool {
    fn from(shape: ShapeType) -> Self {
        match shape {
            ShapeType::Circle => Self::Circle,
            ShapeType::Polygon => Self::Polygon,
            ShapeType::Rectangle => Self::Rectangle,
        }
    }
}

impl std::fmt::Display for DrawingTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hexagon => f.write_str("hexagon"),
            other => f.write_str(other.shape_type().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LatLng;

    #[test]
    fn test_circle_defaults() {
        let zone = DrawingTool::Circle.build_zone(
            Geometry::circle(LatLng::new(5.34, -4.02), 2.0),
            3,
            1_700_000_000_000,
        );
        assert_eq!(zone.id, "custom-circle-1700000000000");
        assert_eq!(zone.name, "Zone 3");
        assert_eq!(zone.color, "#10b981");
        assert!(zone.is_active);
        assert!(zone.is_client_scoped());
    }

    #[test]
    fn test_hexagon_is_a_polygon() {
        let tool = DrawingTool::Hexagon;
        assert_eq!(tool.shape_type(), ShapeType::Polygon);
        assert_eq!(tool.default_name(1), "Hexagone 1");
        assert_eq!(tool.default_color(), "#f59e0b");
        assert_eq!(tool.to_string(), "hexagon");
    }

    #[test]
    fn test_from_shape_type() {
        assert_eq!(DrawingTool::from(ShapeType::Rectangle), DrawingTool::Rectangle);
        assert_eq!(DrawingTool::Rectangle.id_prefix(), "custom-rect");
        assert_eq!(DrawingTool::Polygon.id_prefix(), "custom-poly");
    }
}
