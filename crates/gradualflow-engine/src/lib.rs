//! # GradualFlow Engine
//!
//! Rewrites toolpaths so that the extrusion flow changes gradually.
//!
//! Processing a batch takes three steps:
//! 1. [`stitch_segments`] turns the slicer's implicitly connected segments
//!    into self-contained paths.
//! 2. A [`FlowState`] is built from the batch's settings and layer.
//! 3. [`DiscretizationEngine::process`] splits each path into sub-paths of
//!    constant flow whose levels never change faster than the configured
//!    flow acceleration allows.
//!
//! The engine performs no I/O and holds no shared state; any number of
//! batches may run on it concurrently.

pub mod continuity;
pub mod discretizer;
pub mod state;

pub use continuity::{stitch_segments, RawSegment};
pub use discretizer::{plan_ramp, DiscretizationEngine, RampStep, MAX_LENGTH_DRIFT, MAX_RAMP_STEPS};
pub use state::FlowState;
