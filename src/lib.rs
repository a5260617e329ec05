//! # GradualFlow
//!
//! A post-processor for additive manufacturing toolpaths that limits how
//! fast the extrusion flow may change. Paths whose flow jumps are split
//! into sub-paths that step towards the new flow no faster than the
//! configured flow acceleration allows.
//!
//! ## Architecture
//!
//! GradualFlow is organized as a workspace with multiple crates:
//!
//! 1. **gradualflow-core** - Points, paths, error types
//! 2. **gradualflow-settings** - Per-client settings, settings files, settings store
//! 3. **gradualflow-engine** - Path continuity adapter, flow state, discretization engine
//! 4. **gradualflow-plugin** - Batch service, wire records, debug observers
//! 5. **gradualflow** - Command line binary that integrates all crates

pub mod runner;

pub use gradualflow_core::{
    ConfigurationError, Error, GeometricPath, GeometryError, Point, RampedSubPath, Result,
};
pub use gradualflow_engine::{stitch_segments, DiscretizationEngine, FlowState, RawSegment};
pub use gradualflow_plugin::{
    BatchObserver, GcodePathMessage, ModifyRequest, ModifyResponse, ModifyService, Status,
    StatusCode, SvgDumpObserver,
};
pub use gradualflow_settings::{GradualFlowSettings, SettingsFile, SettingsStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("GRADUALFLOW_BUILD_DATE");

/// Initialize logging
///
/// Logs go to stderr so that responses printed on stdout stay clean.
/// `RUST_LOG` refines the default `info` level. With `json` set, every
/// event is written as one JSON object per line.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
