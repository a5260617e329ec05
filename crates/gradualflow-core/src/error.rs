//! Error handling for GradualFlow
//!
//! Provides the error types for every layer of batch processing:
//! - Configuration errors (missing or invalid per-client settings)
//! - Geometry errors (malformed input segments)
//!
//! Degenerate geometry (a zero-length path asked to carry a flow change)
//! is not an error; the engine handles it locally.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;
use uuid::Uuid;

/// Configuration error type
///
/// Raised when the settings needed to process a batch cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No settings registered for the requesting client
    #[error("No settings registered for client {client}")]
    UnknownClient {
        /// The client identity that was looked up.
        client: Uuid,
    },

    /// A setting carries a value the engine cannot use
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The setting name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A required setting is absent
    #[error("Missing setting '{key}'")]
    MissingValue {
        /// The setting name.
        key: String,
    },
}

/// Geometry error type
///
/// Represents input segments that cannot be turned into a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A segment has inconsistent geometry or attributes
    #[error("Malformed segment {index}: {reason}")]
    MalformedSegment {
        /// Position of the segment within its batch.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A coordinate is not representable in fixed-point units
    #[error("Coordinate out of range: {value}")]
    CoordinateOutOfRange {
        /// The offending coordinate.
        value: f64,
    },
}

/// Main error type for GradualFlow
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
