//! # GradualFlow Plugin
//!
//! The batch boundary of GradualFlow. A slicer sends one request per layer
//! chunk; [`ModifyService::handle`] resolves the client's settings, runs the
//! discretization engine and hands back records in the same shape the
//! slicer sent, or a [`Status`] describing why the batch failed.
//!
//! Debug renderings are produced by [`BatchObserver`]s registered on the
//! service. They run after the engine and can never fail a batch.

pub mod error;
pub mod message;
pub mod modify;
pub mod observer;
pub mod svg;

pub use error::{ObserverError, Status, StatusCode};
pub use message::{GcodePathMessage, ModifyRequest, ModifyResponse};
pub use modify::ModifyService;
pub use observer::{BatchObserver, BatchReport, ObserverHandle, SvgDumpObserver};
pub use svg::{render_svg, Stroke};
