//! GradualFlow Settings Crate
//!
//! Resolves the gradual flow parameters for each client: the settings
//! record itself, settings files on disk, and the concurrent per-client
//! store the batch service reads from.

pub mod config;
pub mod error;
pub mod store;

pub use config::{default_settings_path, GradualFlowSettings, SettingsFile};
pub use error::{SettingsError, SettingsResult};
pub use store::SettingsStore;
