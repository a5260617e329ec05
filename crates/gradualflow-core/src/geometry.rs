//! Planar point types
//!
//! `Point` is the fixed-point coordinate toolpaths travel on the wire with
//! (micrometres). `PointF` is the floating-point working copy the engine
//! interpolates with before snapping back onto the grid.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D coordinate in fixed-point toolpath units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    ///
    /// Computed in `f64` so points at opposite ends of the `i64` range do
    /// not overflow.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_f64(self) -> PointF {
        PointF::new(self.x as f64, self.y as f64)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 2D coordinate in floating-point working precision
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PointF) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at parameter `t` along the segment from `self` to `other`
    pub fn lerp(&self, other: &PointF, t: f64) -> PointF {
        PointF::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// The fixed-point coordinates at the corners of the unit cell holding
    /// this point, floor and ceiling on each axis
    ///
    /// Corners repeat when a coordinate is already integral.
    pub fn grid_corners(&self) -> Result<[Point; 4], GeometryError> {
        let (x0, x1) = (to_coordinate(self.x.floor())?, to_coordinate(self.x.ceil())?);
        let (y0, y1) = (to_coordinate(self.y.floor())?, to_coordinate(self.y.ceil())?);
        Ok([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
        ])
    }
}

impl From<Point> for PointF {
    fn from(point: Point) -> Self {
        point.to_f64()
    }
}

fn to_coordinate(value: f64) -> Result<i64, GeometryError> {
    if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(GeometryError::CoordinateOutOfRange { value });
    }
    Ok(value as i64)
}

/// Total arc length of a polyline
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}
