//! Configuration Loader
//!
//! Environment-aware configuration loading built on the `config` crate.
//! Sources are layered lowest to highest:
//!
//! 1. Struct defaults
//! 2. A config file (`config/dataflow.{toml,yaml,json}` if present, or an explicit path)
//! 3. `DATAFLOW__SECTION__KEY` environment variables
//! 4. Legacy `PREFECT_PROXY_API_URL` / `DATABASE_URL`

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use super::DataflowConfig;
use crate::error::Result;

const ENV_PREFIX: &str = "DATAFLOW";
const DEFAULT_CONFIG_FILE: &str = "config/dataflow";

pub struct ConfigManager {
    config: DataflowConfig,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> Result<ConfigManager> {
        Self::load_from_file(None)
    }

    /// Load configuration, requiring the given file when one is passed
    pub fn load_from_file(config_file: Option<&Path>) -> Result<ConfigManager> {
        Self::load_with_env(config_file, None)
    }

    /// Load configuration against an explicit set of environment variables
    /// instead of the process environment. Useful in tests.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<ConfigManager> {
        let environment = Self::detect_environment();

        let file_source = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let lookup = |key: &str| match &env_vars {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        };
        let legacy_proxy_url = lookup("PREFECT_PROXY_API_URL");
        let legacy_database_url = lookup("DATABASE_URL");

        let config: DataflowConfig = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .set_override_option("proxy.base_url", legacy_proxy_url)?
            .set_override_option("database.url", legacy_database_url)?
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(
            environment = %environment,
            proxy_url = %config.proxy.base_url,
            history_limit = config.run_stats.history_limit,
            log_page_size = config.logs.page_size,
            "Configuration loaded"
        );

        Ok(ConfigManager {
            config,
            config_file: config_file.map(Path::to_path_buf),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DataflowConfig {
        &self.config
    }

    /// Explicit config file this manager was loaded from, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// DATAFLOW_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("DATAFLOW_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}
