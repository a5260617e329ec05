use gradualflow_settings::{GradualFlowSettings, SettingsError, SettingsFile, SettingsStore};
use tempfile::TempDir;
use uuid::Uuid;

fn sample_file() -> (SettingsFile, Uuid, Uuid) {
    let enabled = Uuid::new_v4();
    let disabled = Uuid::new_v4();
    let mut file = SettingsFile::new();
    file.clients
        .insert(enabled, GradualFlowSettings::enabled(3.0, 1.0, 0.25));
    file.clients.insert(disabled, GradualFlowSettings::default());
    (file, enabled, disabled)
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let (file, enabled, _) = sample_file();

    file.save_to_file(&path).unwrap();
    let loaded = SettingsFile::load_from_file(&path).unwrap();
    assert_eq!(loaded, file);
    assert_eq!(loaded.clients[&enabled].max_flow_acceleration, 3.0);
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    let (file, _, disabled) = sample_file();

    file.save_to_file(&path).unwrap();
    let loaded = SettingsFile::load_from_file(&path).unwrap();
    assert_eq!(loaded, file);
    assert!(!loaded.clients[&disabled].gradual_flow_enabled);
}

#[test]
fn test_hand_written_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        r#"
[clients.6f1c0e4e-3a52-4b7e-9a43-2f0d8f1f5b11]
gradual_flow_enabled = true
max_flow_acceleration = 2.0
layer_0_max_flow_acceleration = 0.5
gradual_flow_discretisation_step_size = 0.2
reset_flow_each_layer = false
"#,
    )
    .unwrap();

    let file = SettingsFile::load_from_file(&path).unwrap();
    let client = Uuid::parse_str("6f1c0e4e-3a52-4b7e-9a43-2f0d8f1f5b11").unwrap();
    let store = SettingsStore::from_file(file);
    let settings = store.get(client).unwrap();
    assert_eq!(settings.layer_0_max_flow_acceleration, 0.5);
    assert!(!settings.reset_flow_each_layer);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.yaml");
    std::fs::write(&path, "clients: {}").unwrap();
    assert!(matches!(
        SettingsFile::load_from_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_invalid_entry_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let client = Uuid::new_v4();
    std::fs::write(
        &path,
        format!(
            r#"{{"clients": {{"{}": {{
                "gradual_flow_enabled": true,
                "max_flow_acceleration": 0.0,
                "layer_0_max_flow_acceleration": 1.0,
                "gradual_flow_discretisation_step_size": 0.2
            }}}}}}"#,
            client
        ),
    )
    .unwrap();
    assert!(matches!(
        SettingsFile::load_from_file(&path),
        Err(SettingsError::Invalid(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        SettingsFile::load_from_file(&path),
        Err(SettingsError::LoadError(_))
    ));
}

#[test]
fn test_store_snapshot() {
    let (file, _, _) = sample_file();
    let store = SettingsStore::from_file(file.clone());
    assert_eq!(store.to_file(), file);
}
