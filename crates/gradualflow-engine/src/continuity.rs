//! Path continuity adapter
//!
//! The slicer sends a layer as one connected line string cut into
//! segments: each segment implicitly starts where the previous one ended.
//!
//! ```text
//!  {           segment A          } {     segment B     } {  ...
//!  a.1--------a.2-----a.3---------a.4-----b.1--------b.2---c.1---
//! ```
//!
//! The engine wants every path to be self-contained, so each segment is
//! prefixed with the last point of its predecessor.

use gradualflow_core::{GeometricPath, Point};

/// One input segment as it arrives from the transport layer
#[derive(Debug, Clone, Copy)]
pub struct RawSegment<'a> {
    pub points: &'a [Point],
    pub flow: f64,
    /// Nominal travel speed in mm/s
    pub speed: f64,
}

impl<'a> RawSegment<'a> {
    pub fn new(points: &'a [Point], flow: f64, speed: f64) -> Self {
        Self {
            points,
            flow,
            speed,
        }
    }
}

/// Turn implicitly connected segments into self-contained paths
///
/// A non-empty segment is prefixed with the last point of the segment
/// immediately before it, when that segment has points. Empty segments stay
/// empty so output position `i` always corresponds to input record `i`.
pub fn stitch_segments(segments: &[RawSegment<'_>]) -> Vec<GeometricPath> {
    let mut paths = Vec::with_capacity(segments.len());
    let mut previous_end: Option<Point> = None;

    for (index, segment) in segments.iter().enumerate() {
        let mut path = GeometricPath::new(Vec::new(), segment.flow, segment.speed, index);

        if !segment.points.is_empty() {
            path.points.reserve(segment.points.len() + 1);
            if let Some(start) = previous_end {
                path.points.push(start);
                path.prefixed = true;
            }
            path.points.extend_from_slice(segment.points);
        }

        previous_end = segment.points.last().copied();
        paths.push(path);
    }

    paths
}
