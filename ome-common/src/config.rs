//! Configuration loading and data folder resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result, Seed};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the data folder
pub const DATA_DIR_ENV: &str = "OME_DATA_DIR";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "ome.toml";

/// Metric used to pick the best hyperparameter combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMetric {
    Accuracy,
    #[default]
    F1,
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// On-disk TOML configuration
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub cv_folds: Option<usize>,
    pub undersample: Option<bool>,
    pub negatives_per_positive: Option<usize>,
    pub holdout_rows: Option<usize>,
    pub selection_metric: Option<SelectionMetric>,
    pub logging: LoggingConfig,
}

/// Compiled defaults, matching the published experiment setup
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_dir: PathBuf,
    pub seed: u64,
    pub cv_folds: usize,
    pub undersample: bool,
    pub negatives_per_positive: usize,
    pub holdout_rows: usize,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            seed: 42,
            cv_folds: 10,
            undersample: true,
            negatives_per_positive: 1,
            holdout_rows: 100,
            log_level: "info".to_string(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub cv_folds: Option<usize>,
    pub no_undersample: bool,
}

/// Fully resolved evaluation settings
#[derive(Debug, Clone)]
pub struct EvalSettings {
    pub data_dir: PathBuf,
    pub seed: Seed,
    pub cv_folds: usize,
    pub undersample: bool,
    pub negatives_per_positive: usize,
    pub holdout_rows: usize,
    pub selection_metric: SelectionMetric,
    pub log_level: String,
}

impl EvalSettings {
    /// Resolve settings from CLI overrides, environment, TOML and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml_config = match locate_config_file(cli.config.as_deref())? {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };
        Self::from_sources(cli, &toml_config)
    }

    /// Merge already-loaded sources (no config file lookup)
    pub fn from_sources(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let data_dir = resolve_data_dir(cli.data_dir.as_deref(), DATA_DIR_ENV, toml_config);
        let seed = cli.seed.or(toml_config.seed).unwrap_or(defaults.seed);
        let cv_folds = cli
            .cv_folds
            .or(toml_config.cv_folds)
            .unwrap_or(defaults.cv_folds);
        let undersample = if cli.no_undersample {
            false
        } else {
            toml_config.undersample.unwrap_or(defaults.undersample)
        };
        let holdout_rows = toml_config.holdout_rows.unwrap_or(defaults.holdout_rows);

        if cv_folds < 2 {
            return Err(Error::Config(format!(
                "cv_folds must be at least 2, got {}",
                cv_folds
            )));
        }
        if holdout_rows == 0 {
            return Err(Error::Config("holdout_rows must be positive".to_string()));
        }

        let settings = Self {
            data_dir,
            seed: Seed::new(seed),
            cv_folds,
            undersample,
            negatives_per_positive: toml_config
                .negatives_per_positive
                .unwrap_or(defaults.negatives_per_positive),
            holdout_rows,
            selection_metric: toml_config.selection_metric.unwrap_or_default(),
            log_level: toml_config.logging.level.clone(),
        };
        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }
}

/// Data folder resolution
pub fn resolve_data_dir(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.data_dir {
        return path.clone();
    }

    // Priority 4: Compiled default
    CompiledDefaults::default().data_dir
}

/// Find the configuration file to load
///
/// An explicitly requested file must exist. Otherwise `./ome.toml` is tried,
/// then `<config_dir>/ome/config.toml`. Returns `None` when neither exists.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::NotFound(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    let user_config = dirs::config_dir().map(|d| d.join("ome").join("config.toml"));
    if let Some(path) = user_config {
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_partial_fields() {
        let config: TomlConfig = toml::from_str(
            r#"
            seed = 7
            selection_metric = "accuracy"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.selection_metric, Some(SelectionMetric::Accuracy));
        assert_eq!(config.logging.level, "debug");
        assert!(config.cv_folds.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config = TomlConfig {
            seed: Some(1),
            cv_folds: Some(5),
            undersample: Some(true),
            ..Default::default()
        };
        let cli = CliOverrides {
            data_dir: Some(PathBuf::from("/tmp/ome-cli")),
            seed: Some(99),
            no_undersample: true,
            ..Default::default()
        };

        let settings = EvalSettings::from_sources(&cli, &toml_config).unwrap();
        assert_eq!(settings.seed.value(), 99);
        assert_eq!(settings.cv_folds, 5);
        assert!(!settings.undersample);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/ome-cli"));
    }

    #[test]
    fn test_rejects_single_fold() {
        let cli = CliOverrides {
            data_dir: Some(PathBuf::from("data")),
            cv_folds: Some(1),
            ..Default::default()
        };
        let err = EvalSettings::from_sources(&cli, &TomlConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = locate_config_file(Some(Path::new("/nonexistent/ome.toml"))).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
