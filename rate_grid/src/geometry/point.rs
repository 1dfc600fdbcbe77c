//! Geographic point type used throughout the crate.

use serde::{Deserialize, Serialize};

/// Representation of a WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both components are finite and inside the
    /// latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Midpoint of the straight lat/lng segment between two points.
    ///
    /// Only meaningful for points a few hundred metres apart, which is all
    /// the grid ever needs.
    pub fn midpoint(a: Point, b: Point) -> Point {
        Point::new(
            (a.latitude + b.latitude) / 2.0,
            (a.longitude + b.longitude) / 2.0,
        )
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo::Point<f64>> for Point {
    fn from(p: geo::Point<f64>) -> Self {
        Point::new(p.y(), p.x())
    }
}
