//! Configuration loading from YAML directories.

use inventory_propagation::config::{ConfigManager, ConfigResult, ConfigurationError};
use inventory_propagation::propagation::PropagationSettings;
use std::fs;
use tempfile::TempDir;

fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).expect("write config file");
    }
    dir
}

fn load(dir: &TempDir, environment: &str) -> ConfigResult<ConfigManager> {
    ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), environment)
}

#[test]
fn empty_directory_yields_defaults() {
    let dir = config_dir(&[]);
    let manager = load(&dir, "test").unwrap();

    let config = manager.config();
    assert_eq!(manager.environment(), "test");
    assert_eq!(manager.config_directory(), dir.path());
    assert_eq!(config.store.base_name, "deviceauth");
    assert_eq!(config.propagation.listing_batch_size, 100);
    assert_eq!(config.propagation.status_batch_size, 512);
    assert_eq!(config.propagation.source_label, "deviceauth");
}

#[test]
fn propagation_section_sets_batching_and_source() {
    let dir = config_dir(&[(
        "propagation.yaml",
        "propagation:\n  status_batch_size: 64\n  listing_batch_size: 10\n  source_label: idsvc\n",
    )]);

    let config = load(&dir, "test").unwrap().into_config();

    assert_eq!(config.propagation.status_batch_size, 64);
    assert_eq!(config.propagation.listing_batch_size, 10);
    assert_eq!(config.propagation.source_label, "idsvc");
}

#[test]
fn unknown_section_fails_to_load() {
    let dir = config_dir(&[("propagation.yaml", "engine:\n  status_batch_size: 64\n")]);

    let err = load(&dir, "test").unwrap_err();

    match err {
        ConfigurationError::LoadError { message, .. } => assert!(message.contains("engine")),
        other => panic!("expected LoadError, got {other:?}"),
    }
}

#[test]
fn environment_file_overrides_base_file() {
    let dir = config_dir(&[
        (
            "propagation.yaml",
            "database:\n  url: postgresql://localhost/deviceauth\n  max_connections: 8\n\
             propagation:\n  status_batch_size: 256\n",
        ),
        (
            "propagation.staging.yaml",
            "database:\n  max_connections: 3\nlogging:\n  level: warn\n  json: true\n",
        ),
    ]);

    let config = load(&dir, "staging").unwrap().into_config();

    assert_eq!(config.database.url, "postgresql://localhost/deviceauth");
    assert_eq!(config.database.max_connections, 3);
    assert_eq!(config.propagation.status_batch_size, 256);
    assert_eq!(config.propagation.listing_batch_size, 100);
    assert_eq!(config.logging.level.as_deref(), Some("warn"));
    assert!(config.logging.json);
}

#[test]
fn other_environment_files_are_ignored() {
    let dir = config_dir(&[(
        "propagation.production.yaml",
        "propagation:\n  status_batch_size: 7\n",
    )]);

    let config = load(&dir, "test").unwrap().into_config();

    assert_eq!(config.propagation.status_batch_size, 512);
}

#[test]
fn settings_follow_loaded_config() {
    let dir = config_dir(&[(
        "propagation.yaml",
        "store:\n  base_name: auth\n\
         propagation:\n  listing_batch_size: 25\n  source_label: auth-svc\n",
    )]);

    let config = load(&dir, "test").unwrap().into_config();
    let settings = PropagationSettings::from(&config);

    assert_eq!(settings.store_base_name, "auth");
    assert_eq!(settings.listing_batch_size, 25);
    assert_eq!(settings.status_batch_size, 512);
    assert_eq!(settings.source_label, "auth-svc");
}

#[test]
fn zero_batch_size_is_rejected() {
    let dir = config_dir(&[("propagation.yaml", "propagation:\n  listing_batch_size: 0\n")]);

    let err = load(&dir, "test").unwrap_err();

    match err {
        ConfigurationError::InvalidValue { field, .. } => {
            assert_eq!(field, "propagation.listing_batch_size");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn empty_base_name_is_rejected() {
    let dir = config_dir(&[("propagation.yaml", "store:\n  base_name: \"\"\n")]);

    let err = load(&dir, "test").unwrap_err();

    assert!(matches!(
        err,
        ConfigurationError::MissingRequiredField { ref field, .. } if field == "store.base_name"
    ));
}

#[test]
fn malformed_yaml_is_a_load_error() {
    let dir = config_dir(&[("propagation.yaml", "propagation: [unterminated\n")]);

    let err = load(&dir, "test").unwrap_err();

    assert!(matches!(err, ConfigurationError::LoadError { .. }));
}
