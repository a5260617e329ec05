//! # GradualFlow Core
//!
//! Core types shared by every GradualFlow crate.
//! Provides the fixed-point and floating-point point types, the path
//! records the discretization engine consumes and produces, and the
//! error taxonomy used across batch processing.

pub mod error;
pub mod geometry;
pub mod path;

pub use error::{ConfigurationError, Error, GeometryError, Result};
pub use geometry::{polyline_length, Point, PointF};
pub use path::{GeometricPath, RampedSubPath};

/// Number of geometry units (micrometres) per millimetre
pub const MICRONS_PER_MM: f64 = 1000.0;
