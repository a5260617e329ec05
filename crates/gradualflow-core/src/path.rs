//! Path records consumed and produced by the discretization engine.

use crate::geometry::{polyline_length, Point};

/// One continuous line string with the flow it should reach
///
/// Each path owns its geometry. `source` indexes the input record the path
/// was built from so per-segment attributes can be echoed back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricPath {
    pub points: Vec<Point>,
    pub target_flow: f64,
    /// Nominal travel speed in mm/s
    pub speed: f64,
    /// Index of the input record this path came from
    pub source: usize,
    /// First point was borrowed from the previous record's last point
    pub prefixed: bool,
}

impl GeometricPath {
    /// Creates a path that is not stitched to a predecessor.
    pub fn new(points: Vec<Point>, target_flow: f64, speed: f64, source: usize) -> Self {
        Self {
            points,
            target_flow,
            speed,
            source,
            prefixed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// The path has no extent along which a flow change can be spread.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.length() <= 0.0
    }
}

/// A contiguous piece of a [`GeometricPath`] travelled at one flow level
#[derive(Debug, Clone, PartialEq)]
pub struct RampedSubPath {
    pub points: Vec<Point>,
    pub flow: f64,
    /// Index of the input record the parent path came from
    pub source: usize,
    /// First point coincides with the previous output element's last point
    pub continues_previous: bool,
}

impl RampedSubPath {
    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Points as they appear on the wire, where a path implicitly starts
    /// at the end of the previous one.
    pub fn wire_points(&self) -> &[Point] {
        if self.continues_previous && !self.points.is_empty() {
            &self.points[1..]
        } else {
            &self.points
        }
    }
}
