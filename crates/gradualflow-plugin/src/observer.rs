//! Batch observers
//!
//! Observers see every batch after the engine has finished with it. They
//! are the place for debug output; whatever they do, the batch result is
//! already fixed.

use crate::error::ObserverError;
use crate::svg::{render_svg, Stroke};
use gradualflow_core::{GeometricPath, RampedSubPath};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A finished batch as seen by observers
#[derive(Debug, Clone, Copy)]
pub struct BatchReport<'a> {
    pub client: Uuid,
    pub layer_nr: i64,
    /// Self-contained paths the engine received
    pub input: &'a [GeometricPath],
    /// Sub-paths the engine produced
    pub output: &'a [RampedSubPath],
}

/// Hook invoked after each successfully processed batch
pub trait BatchObserver: Send + Sync {
    /// Name used when reporting failures
    fn name(&self) -> &str;

    /// Called once per batch, after discretization
    fn on_batch_complete(&self, report: &BatchReport<'_>) -> Result<(), ObserverError>;
}

/// Arc-wrapped observer for sharing between services
pub type ObserverHandle = Arc<dyn BatchObserver>;

/// Writes an SVG of every batch before and after discretization
///
/// Files are numbered in the order batches complete:
/// `svg_<n>_original.svg` and `svg_<n>_discretized_path.svg`.
#[derive(Debug)]
pub struct SvgDumpObserver {
    directory: PathBuf,
    counter: AtomicUsize,
}

impl SvgDumpObserver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of batches dumped so far
    pub fn dump_count(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }

    fn write(&self, name: String, svg: String) -> Result<PathBuf, ObserverError> {
        let path = self.directory.join(name);
        fs::write(&path, svg)?;
        Ok(path)
    }
}

impl BatchObserver for SvgDumpObserver {
    fn name(&self) -> &str {
        "svg-dump"
    }

    fn on_batch_complete(&self, report: &BatchReport<'_>) -> Result<(), ObserverError> {
        fs::create_dir_all(&self.directory)?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);

        let original = self.write(
            format!("svg_{}_original.svg", n),
            render_svg(&Stroke::from_paths(report.input)),
        )?;
        let discretized = self.write(
            format!("svg_{}_discretized_path.svg", n),
            render_svg(&Stroke::from_sub_paths(report.output)),
        )?;

        tracing::info!(
            "Wrote debug SVGs for layer {}: {} and {}",
            report.layer_nr,
            original.display(),
            discretized.display()
        );
        Ok(())
    }
}
