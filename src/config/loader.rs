//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are merged in order,
//! later ones winning:
//!
//! 1. `{dir}/propagation.yaml`
//! 2. `{dir}/propagation.{environment}.yaml`
//! 3. `PROPAGATION__{SECTION}__{KEY}` environment variables
//!
//! Missing files are skipped; missing keys fall back to defaults.

use super::error::{ConfigResult, ConfigurationError};
use super::PropagationConfig;
use ::config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_STEM: &str = "propagation";
const ENV_PREFIX: &str = "PROPAGATION";
const ENV_SEPARATOR: &str = "__";

/// Loaded and validated configuration together with where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: PropagationConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<ConfigManager> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<ConfigManager> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit
    /// environment, without touching process-wide environment detection.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<ConfigManager> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading propagation configuration"
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        debug!(
            environment = %environment,
            store_base_name = %config.store.base_name,
            listing_batch_size = config.propagation.listing_batch_size,
            status_batch_size = config.propagation.status_batch_size,
            "Propagation configuration loaded"
        );

        Ok(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        })
    }

    fn build(config_directory: &Path, environment: &str) -> ConfigResult<PropagationConfig> {
        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.yaml"));
        let env_file = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.yaml"));

        let settings = Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| load_error(config_directory, e))?;

        settings
            .try_deserialize::<PropagationConfig>()
            .map_err(|e| load_error(config_directory, e))
    }

    /// Current environment: `PROPAGATION_ENV`, then `APP_ENV`, else
    /// `development`.
    pub fn detect_environment() -> String {
        env::var("PROPAGATION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("PROPAGATION_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn into_config(self) -> PropagationConfig {
        self.config
    }
}

fn load_error(config_directory: &Path, error: ::config::ConfigError) -> ConfigurationError {
    ConfigurationError::load_error(config_directory.display().to_string(), error.to_string())
}
