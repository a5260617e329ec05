//! Wire records exchanged with the slicer
//!
//! A record carries one segment of the layer's line string. Any field the
//! slicer sends besides the geometry, flow and speed (line type, mesh name,
//! fan speed, ...) is kept in `attributes` and echoed back untouched.

use gradualflow_core::{GeometryError, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One toolpath segment as sent by the slicer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GcodePathMessage {
    /// Points after the implicit start (the previous segment's last point)
    #[serde(default)]
    pub path: Vec<Point>,
    pub flow: f64,
    /// Travel speed in mm/s
    #[serde(default)]
    pub speed: f64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl GcodePathMessage {
    pub fn new(path: Vec<Point>, flow: f64, speed: f64) -> Self {
        Self {
            path,
            flow,
            speed,
            attributes: Map::new(),
        }
    }

    /// Same record with a different geometry and flow
    pub fn with_geometry(&self, path: Vec<Point>, flow: f64) -> Self {
        Self {
            path,
            flow,
            speed: self.speed,
            attributes: self.attributes.clone(),
        }
    }

    /// Check the record at batch position `index` can be processed
    pub fn validate(&self, index: usize) -> Result<(), GeometryError> {
        if !self.flow.is_finite() || self.flow < 0.0 {
            return Err(GeometryError::MalformedSegment {
                index,
                reason: format!("flow must be a finite value >= 0, got {}", self.flow),
            });
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(GeometryError::MalformedSegment {
                index,
                reason: format!("speed must be a finite value >= 0, got {}", self.speed),
            });
        }
        Ok(())
    }
}

/// One batch: every segment of a layer chunk, in travel order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyRequest {
    #[serde(default)]
    pub layer_nr: i64,
    #[serde(default)]
    pub gcode_paths: Vec<GcodePathMessage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyResponse {
    #[serde(default)]
    pub gcode_paths: Vec<GcodePathMessage>,
}
