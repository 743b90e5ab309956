//! Shared integration test helpers

pub mod rdf_generator;

use ome_common::config::{CliOverrides, EvalSettings, TomlConfig};
use std::path::Path;

/// Settings rooted at `data_dir` with a small fold count
pub fn settings(data_dir: &Path, cv_folds: usize) -> EvalSettings {
    EvalSettings::from_sources(
        &CliOverrides {
            data_dir: Some(data_dir.to_path_buf()),
            seed: Some(42),
            cv_folds: Some(cv_folds),
            ..CliOverrides::default()
        },
        &TomlConfig::default(),
    )
    .expect("settings")
}
