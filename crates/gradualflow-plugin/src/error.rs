//! Error handling for the batch boundary
//!
//! Failures leave the plugin as a [`Status`], mirroring the status codes of
//! the RPC transport the slicer talks over:
//! - Configuration errors become `NotFound`
//! - Malformed input becomes `InvalidArgument`
//! - Everything else becomes `Internal`

use gradualflow_core::{ConfigurationError, Error, GeometryError};
use std::fmt;
use thiserror::Error;

/// RPC status code reported for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    InvalidArgument,
    NotFound,
    Internal,
}

impl StatusCode {
    /// Numeric value used on the wire
    pub fn as_i32(self) -> i32 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::InvalidArgument => 3,
            StatusCode::NotFound => 5,
            StatusCode::Internal => 13,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// A failed batch, as reported to the caller
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ConfigurationError> for Status {
    fn from(err: ConfigurationError) -> Self {
        Status::not_found(err.to_string())
    }
}

impl From<GeometryError> for Status {
    fn from(err: GeometryError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Configuration(e) => e.into(),
            Error::Geometry(e) => e.into(),
            other => Status::internal(other.to_string()),
        }
    }
}

/// Failure inside a batch observer; logged and dropped by the service
#[derive(Error, Debug)]
pub enum ObserverError {
    /// Writing the artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact could not be produced
    #[error("Render error: {0}")]
    Render(String),
}
