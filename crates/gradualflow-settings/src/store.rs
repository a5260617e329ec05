//! Per-client settings store
//!
//! Batches read from the store concurrently; writes happen only when a
//! client broadcasts new settings, never while a batch holds a record.
//! Lookups hand out clones so the engine works on a value resolved once.

use crate::config::{GradualFlowSettings, SettingsFile};
use gradualflow_core::ConfigurationError;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Client identity → gradual flow settings
#[derive(Debug, Default)]
pub struct SettingsStore {
    clients: RwLock<HashMap<Uuid, GradualFlowSettings>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the entries of a settings file
    pub fn from_file(file: SettingsFile) -> Self {
        Self {
            clients: RwLock::new(file.clients.into_iter().collect()),
        }
    }

    /// Register or replace the settings of a client
    pub fn broadcast(
        &self,
        client: Uuid,
        settings: GradualFlowSettings,
    ) -> Result<(), ConfigurationError> {
        settings.validate()?;
        tracing::debug!(
            "Settings for client {} updated (enabled: {})",
            client,
            settings.gradual_flow_enabled
        );
        self.clients.write().insert(client, settings);
        Ok(())
    }

    /// Register settings from a slicer's string-valued broadcast
    pub fn broadcast_raw(
        &self,
        client: Uuid,
        values: &HashMap<String, String>,
    ) -> Result<(), ConfigurationError> {
        let settings = GradualFlowSettings::from_broadcast(values)?;
        self.broadcast(client, settings)
    }

    /// Settings of a client, or a configuration error if none are known
    pub fn get(&self, client: Uuid) -> Result<GradualFlowSettings, ConfigurationError> {
        self.clients
            .read()
            .get(&client)
            .cloned()
            .ok_or(ConfigurationError::UnknownClient { client })
    }

    pub fn remove(&self, client: Uuid) -> Option<GradualFlowSettings> {
        self.clients.write().remove(&client)
    }

    pub fn contains(&self, client: Uuid) -> bool {
        self.clients.read().contains_key(&client)
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Snapshot of the store as a settings file
    pub fn to_file(&self) -> SettingsFile {
        SettingsFile {
            clients: self
                .clients
                .read()
                .iter()
                .map(|(client, settings)| (*client, settings.clone()))
                .collect(),
        }
    }
}
