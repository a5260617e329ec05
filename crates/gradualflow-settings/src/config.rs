//! Gradual flow settings and settings files
//!
//! A `GradualFlowSettings` record is resolved once per batch and passed by
//! value into the engine. Settings reach the service either from a
//! settings file (JSON or TOML, selected by extension) or from the
//! string-valued settings a slicer broadcasts for each client.

use crate::error::{SettingsError, SettingsResult};
use gradualflow_core::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Gradual flow parameters for one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradualFlowSettings {
    /// When false, batches pass through unmodified
    pub gradual_flow_enabled: bool,
    /// Maximum change of flow per second
    pub max_flow_acceleration: f64,
    /// Maximum change of flow per second on the first layer
    pub layer_0_max_flow_acceleration: f64,
    /// Duration in seconds of one discrete flow level
    pub gradual_flow_discretisation_step_size: f64,
    /// Start every batch from zero flow instead of the client's last flow
    #[serde(default = "default_reset_flow_each_layer")]
    pub reset_flow_each_layer: bool,
}

fn default_reset_flow_each_layer() -> bool {
    true
}

impl Default for GradualFlowSettings {
    fn default() -> Self {
        Self {
            gradual_flow_enabled: false,
            max_flow_acceleration: 1.0,
            layer_0_max_flow_acceleration: 1.0,
            gradual_flow_discretisation_step_size: 0.2,
            reset_flow_each_layer: true,
        }
    }
}

impl GradualFlowSettings {
    pub const KEY_ENABLED: &'static str = "gradual_flow_enabled";
    pub const KEY_MAX_FLOW_ACCELERATION: &'static str = "max_flow_acceleration";
    pub const KEY_LAYER_0_MAX_FLOW_ACCELERATION: &'static str = "layer_0_max_flow_acceleration";
    pub const KEY_STEP_SIZE: &'static str = "gradual_flow_discretisation_step_size";
    pub const KEY_RESET_FLOW_EACH_LAYER: &'static str = "reset_flow_each_layer";

    /// Settings with gradual flow switched on and the given limits
    pub fn enabled(max_flow_acceleration: f64, layer_0_max_flow_acceleration: f64, step: f64) -> Self {
        Self {
            gradual_flow_enabled: true,
            max_flow_acceleration,
            layer_0_max_flow_acceleration,
            gradual_flow_discretisation_step_size: step,
            reset_flow_each_layer: true,
        }
    }

    /// Flow acceleration that applies to the given layer
    pub fn flow_acceleration_for_layer(&self, layer_nr: i64) -> f64 {
        if layer_nr == 0 {
            self.layer_0_max_flow_acceleration
        } else {
            self.max_flow_acceleration
        }
    }

    /// Check the values the engine depends on
    ///
    /// Disabled settings are still validated; a client may toggle the
    /// feature on without re-sending its limits.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        positive(Self::KEY_MAX_FLOW_ACCELERATION, self.max_flow_acceleration)?;
        positive(
            Self::KEY_LAYER_0_MAX_FLOW_ACCELERATION,
            self.layer_0_max_flow_acceleration,
        )?;
        positive(Self::KEY_STEP_SIZE, self.gradual_flow_discretisation_step_size)?;
        Ok(())
    }

    /// Parse the string-valued settings a slicer broadcasts
    ///
    /// Unknown keys are ignored. `reset_flow_each_layer` is optional and
    /// defaults to true; every other gradual flow key is required.
    pub fn from_broadcast(values: &HashMap<String, String>) -> Result<Self, ConfigurationError> {
        let settings = Self {
            gradual_flow_enabled: parse_bool(Self::KEY_ENABLED, required(values, Self::KEY_ENABLED)?)?,
            max_flow_acceleration: parse_scalar(
                Self::KEY_MAX_FLOW_ACCELERATION,
                required(values, Self::KEY_MAX_FLOW_ACCELERATION)?,
            )?,
            layer_0_max_flow_acceleration: parse_scalar(
                Self::KEY_LAYER_0_MAX_FLOW_ACCELERATION,
                required(values, Self::KEY_LAYER_0_MAX_FLOW_ACCELERATION)?,
            )?,
            gradual_flow_discretisation_step_size: parse_scalar(
                Self::KEY_STEP_SIZE,
                required(values, Self::KEY_STEP_SIZE)?,
            )?,
            reset_flow_each_layer: match values.get(Self::KEY_RESET_FLOW_EACH_LAYER) {
                Some(raw) => parse_bool(Self::KEY_RESET_FLOW_EACH_LAYER, raw)?,
                None => true,
            },
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: format!("must be a finite value > 0, got {}", value),
        });
    }
    Ok(())
}

fn required<'a>(values: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigurationError> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ConfigurationError::MissingValue {
            key: key.to_string(),
        })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigurationError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a boolean, got '{}'", raw),
        }),
    }
}

fn parse_scalar(key: &str, raw: &str) -> Result<f64, ConfigurationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}' is not a number: {}", raw, e),
        })
}

/// Settings file contents: one settings record per client identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub clients: BTreeMap<Uuid, GradualFlowSettings>,
}

impl SettingsFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let file: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(SettingsError::UnsupportedFormat(
                    "settings file must be .json or .toml".to_string(),
                ))
            }
        };

        file.validate()?;
        tracing::debug!(
            "Loaded settings for {} client(s) from {}",
            file.clients.len(),
            path.display()
        );
        Ok(file)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => {
                return Err(SettingsError::UnsupportedFormat(
                    "settings file must be .json or .toml".to_string(),
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate every client entry
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.clients.values().try_for_each(GradualFlowSettings::validate)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Platform location of the settings file (`<config dir>/gradualflow/settings.toml`)
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gradualflow").join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_layer_acceleration_selection() {
        let settings = GradualFlowSettings::enabled(4.0, 1.5, 0.2);
        assert_eq!(settings.flow_acceleration_for_layer(0), 1.5);
        assert_eq!(settings.flow_acceleration_for_layer(1), 4.0);
        assert_eq!(settings.flow_acceleration_for_layer(57), 4.0);
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(GradualFlowSettings::default().validate().is_ok());

        let settings = GradualFlowSettings {
            gradual_flow_discretisation_step_size: 0.0,
            ..GradualFlowSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue { ref key, .. } if key == GradualFlowSettings::KEY_STEP_SIZE
        ));

        let settings = GradualFlowSettings {
            max_flow_acceleration: f64::NAN,
            ..GradualFlowSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_broadcast() {
        let values = broadcast(&[
            ("gradual_flow_enabled", "True"),
            ("max_flow_acceleration", "2.5"),
            ("layer_0_max_flow_acceleration", "1"),
            ("gradual_flow_discretisation_step_size", " 0.2 "),
            ("machine_name", "ignored"),
        ]);
        let settings = GradualFlowSettings::from_broadcast(&values).unwrap();
        assert!(settings.gradual_flow_enabled);
        assert_eq!(settings.max_flow_acceleration, 2.5);
        assert_eq!(settings.layer_0_max_flow_acceleration, 1.0);
        assert_eq!(settings.gradual_flow_discretisation_step_size, 0.2);
        assert!(settings.reset_flow_each_layer);
    }

    #[test]
    fn test_from_broadcast_errors() {
        let missing = broadcast(&[("gradual_flow_enabled", "False")]);
        assert_eq!(
            GradualFlowSettings::from_broadcast(&missing).unwrap_err(),
            ConfigurationError::MissingValue {
                key: "max_flow_acceleration".to_string()
            }
        );

        let bad_bool = broadcast(&[
            ("gradual_flow_enabled", "maybe"),
            ("max_flow_acceleration", "1"),
            ("layer_0_max_flow_acceleration", "1"),
            ("gradual_flow_discretisation_step_size", "0.2"),
        ]);
        assert!(GradualFlowSettings::from_broadcast(&bad_bool).is_err());

        let negative = broadcast(&[
            ("gradual_flow_enabled", "true"),
            ("max_flow_acceleration", "-1"),
            ("layer_0_max_flow_acceleration", "1"),
            ("gradual_flow_discretisation_step_size", "0.2"),
        ]);
        assert!(GradualFlowSettings::from_broadcast(&negative).is_err());
    }

    #[test]
    fn test_reset_flag_defaults_when_absent_from_file() {
        let json = r#"{
            "gradual_flow_enabled": true,
            "max_flow_acceleration": 3.0,
            "layer_0_max_flow_acceleration": 1.0,
            "gradual_flow_discretisation_step_size": 0.5
        }"#;
        let settings: GradualFlowSettings = serde_json::from_str(json).unwrap();
        assert!(settings.reset_flow_each_layer);
    }
}
