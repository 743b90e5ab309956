//! Integration tests for layered configuration resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate OME_DATA_DIR are marked with #[serial].

use ome_common::config::{
    load_toml_config, resolve_data_dir, CliOverrides, CompiledDefaults, EvalSettings,
    SelectionMetric, TomlConfig, DATA_DIR_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_match_published_run() {
    let defaults = CompiledDefaults::default();
    assert_eq!(defaults.data_dir, PathBuf::from("data"));
    assert_eq!(defaults.seed, 42);
    assert_eq!(defaults.cv_folds, 10);
    assert!(defaults.undersample);
    assert_eq!(defaults.holdout_rows, 100);
}

#[test]
#[serial]
fn test_data_dir_falls_back_to_default() {
    env::remove_var(DATA_DIR_ENV);

    let dir = resolve_data_dir(None, DATA_DIR_ENV, &TomlConfig::default());
    assert_eq!(dir, CompiledDefaults::default().data_dir);
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(DATA_DIR_ENV, "/tmp/ome-env-data");

    let toml_config = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/ome-toml-data")),
        ..Default::default()
    };
    let dir = resolve_data_dir(None, DATA_DIR_ENV, &toml_config);
    assert_eq!(dir, PathBuf::from("/tmp/ome-env-data"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_cli_beats_env_var() {
    env::set_var(DATA_DIR_ENV, "/tmp/ome-env-data");

    let dir = resolve_data_dir(
        Some(Path::new("/tmp/ome-cli-data")),
        DATA_DIR_ENV,
        &TomlConfig::default(),
    );
    assert_eq!(dir, PathBuf::from("/tmp/ome-cli-data"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_toml_file_is_used_when_env_unset() {
    env::remove_var(DATA_DIR_ENV);

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ome.toml");
    std::fs::write(
        &path,
        r#"
data_dir = "/tmp/ome-from-file"
seed = 1234
cv_folds = 5
undersample = false
negatives_per_positive = 2
holdout_rows = 50
selection_metric = "accuracy"
"#,
    )
    .unwrap();

    let cli = CliOverrides {
        config: Some(path),
        ..Default::default()
    };
    let settings = EvalSettings::resolve(&cli).unwrap();

    assert_eq!(settings.data_dir, PathBuf::from("/tmp/ome-from-file"));
    assert_eq!(settings.seed.value(), 1234);
    assert_eq!(settings.cv_folds, 5);
    assert!(!settings.undersample);
    assert_eq!(settings.negatives_per_positive, 2);
    assert_eq!(settings.holdout_rows, 50);
    assert_eq!(settings.selection_metric, SelectionMetric::Accuracy);
}

#[test]
fn test_malformed_toml_is_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "seed = \"not a number\"").unwrap();

    assert!(load_toml_config(&path).is_err());
}
