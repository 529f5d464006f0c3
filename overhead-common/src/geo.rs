//! Geofence geometry
//!
//! The region of interest is a single axis-aligned rectangle in degrees.
//! Containment is inclusive on all four edges.

use serde::{Deserialize, Serialize};

/// A point on the map, longitude first to match GeoJSON ordering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `[lon, lat]` pair as stored in tracks and GeoJSON
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Rectangle given as (top-latitude, right-longitude, bottom-latitude, left-longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for BoundingBox {
    /// Inner-city Brisbane, the region the tracker was built for
    fn default() -> Self {
        Self::new(-27.46534, 153.02393, -27.51268, 152.95372)
    }
}

impl BoundingBox {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// True iff the point lies within the rectangle, edges included
    pub fn contains(&self, position: Position) -> bool {
        let lat_in_bounds = position.lat <= self.top && position.lat >= self.bottom;
        let lon_in_bounds = position.lon <= self.right && position.lon >= self.left;
        lat_in_bounds && lon_in_bounds
    }

    /// Closed polygon ring, clockwise from the top-left corner
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.left, self.top],
            [self.right, self.top],
            [self.right, self.bottom],
            [self.left, self.bottom],
            [self.left, self.top],
        ]
    }
}

/// Whether an aircraft at `position` is overhead the given rectangle
pub fn is_overhead(position: Position, rectangle: &BoundingBox) -> bool {
    rectangle.contains(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> BoundingBox {
        BoundingBox::new(10.0, 20.0, 0.0, 5.0)
    }

    #[test]
    fn test_point_inside() {
        assert!(is_overhead(Position::new(10.0, 5.0), &rect()));
    }

    #[test]
    fn test_point_outside_each_side() {
        let r = rect();
        assert!(!is_overhead(Position::new(10.0, 10.0001), &r), "north");
        assert!(!is_overhead(Position::new(20.0001, 5.0), &r), "east");
        assert!(!is_overhead(Position::new(10.0, -0.0001), &r), "south");
        assert!(!is_overhead(Position::new(4.9999, 5.0), &r), "west");
    }

    #[test]
    fn test_edges_are_inclusive() {
        let r = rect();
        assert!(is_overhead(Position::new(10.0, 10.0), &r), "top edge");
        assert!(is_overhead(Position::new(20.0, 5.0), &r), "right edge");
        assert!(is_overhead(Position::new(10.0, 0.0), &r), "bottom edge");
        assert!(is_overhead(Position::new(5.0, 5.0), &r), "left edge");
        assert!(is_overhead(Position::new(5.0, 10.0), &r), "top-left corner");
        assert!(is_overhead(Position::new(20.0, 0.0), &r), "bottom-right corner");
    }

    #[test]
    fn test_default_geofence_contains_its_centre() {
        let r = BoundingBox::default();
        let centre = Position::new((r.left + r.right) / 2.0, (r.top + r.bottom) / 2.0);
        assert!(r.contains(centre));
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = rect().ring();
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[1], [20.0, 10.0]);
        assert_eq!(ring[3], [5.0, 0.0]);
    }
}
