//! Geodesic primitives the grid is built from.
//!
//! All grid geometry derives from two operations on a spherical earth:
//! moving a point a given distance along a compass bearing, and measuring
//! the great-circle distance between two points.

mod point;

pub use point::Point;

use geo::{Destination, Distance, Haversine};

/// The four compass bearings the grid engine moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearing {
    North,
    East,
    South,
    West,
}

impl Bearing {
    /// Bearing in degrees clockwise from true north.
    pub fn degrees(self) -> f64 {
        match self {
            Bearing::North => 0.0,
            Bearing::East => 90.0,
            Bearing::South => 180.0,
            Bearing::West => 270.0,
        }
    }
}

/// Destination-point and distance model consumed by the grid engine.
pub trait Geodesic {
    /// Point reached by travelling `meters` from `origin` along `bearing`.
    fn destination(&self, origin: Point, meters: f64, bearing: Bearing) -> Point;

    /// Great-circle distance in metres.
    fn distance(&self, a: Point, b: Point) -> f64;
}

/// Spherical-earth model backed by the haversine formulas of the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalEarth;

impl Geodesic for SphericalEarth {
    fn destination(&self, origin: Point, meters: f64, bearing: Bearing) -> Point {
        if meters == 0.0 {
            return origin;
        }
        Haversine
            .destination(origin.into(), bearing.degrees(), meters)
            .into()
    }

    fn distance(&self, a: Point, b: Point) -> f64 {
        Haversine.distance(geo::Point::from(a), geo::Point::from(b))
    }
}

/// Moves `origin` by `meters` along `bearing` on the spherical model.
pub fn destination(origin: Point, meters: f64, bearing: Bearing) -> Point {
    SphericalEarth.destination(origin, meters, bearing)
}

/// Great-circle distance between two points in metres.
pub fn distance(a: Point, b: Point) -> f64 {
    SphericalEarth.distance(a, b)
}
