//! # Dataflow Core Configuration
//!
//! Typed configuration for the proxy client, the database adapters, the
//! statistics engine and logging.
//!
//! ## Architecture
//!
//! - **Layered Sources**: defaults, then an optional file, then environment
//! - **Legacy Variables**: `PREFECT_PROXY_API_URL` and `DATABASE_URL` are honoured
//! - **Explicit Validation**: invalid values fail loading instead of being coerced
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dataflow_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let proxy_url = &manager.config().proxy.base_url;
//! let history_limit = manager.config().run_stats.history_limit;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

use crate::constants::{
    FlowRunStatus, DEFAULT_FLOW_RUNS_TIMEOUT_SECONDS, DEFAULT_LOG_PAGE_SIZE,
    DEFAULT_PROXY_TIMEOUT_SECONDS, DEFAULT_RUN_HISTORY_LIMIT,
};
use crate::error::{DataflowError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataflowConfig {
    /// Prefect proxy connection settings
    pub proxy: ProxyConfig,

    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Run-time statistics defaults
    pub run_stats: RunStatsConfig,

    /// Flow-run log pagination
    pub logs: LogsConfig,

    /// Structured logging
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub flow_runs_timeout_seconds: u64,
    /// Sent as the `x-ddp-org` header; empty when unset
    pub org_slug: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8085".to_string(),
            timeout_seconds: DEFAULT_PROXY_TIMEOUT_SECONDS,
            flow_runs_timeout_seconds: DEFAULT_FLOW_RUNS_TIMEOUT_SECONDS,
            org_slug: None,
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn flow_runs_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_runs_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/dataflow_development".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunStatsConfig {
    pub history_limit: u32,
    pub statuses: Vec<FlowRunStatus>,
}

impl Default for RunStatsConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_RUN_HISTORY_LIMIT,
            statuses: vec![FlowRunStatus::Completed],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogsConfig {
    pub page_size: u32,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LOG_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; falls back to an environment-based default
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl DataflowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.proxy.base_url.trim().is_empty() {
            return Err(DataflowError::configuration("proxy.base_url must not be empty"));
        }

        if self.proxy.timeout_seconds == 0 || self.proxy.flow_runs_timeout_seconds == 0 {
            return Err(DataflowError::configuration(
                "proxy timeouts must be greater than 0",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(DataflowError::configuration(
                "database.max_connections must be greater than 0",
            ));
        }

        if self.run_stats.history_limit == 0 {
            return Err(DataflowError::configuration(
                "run_stats.history_limit must be greater than 0",
            ));
        }

        if self.run_stats.statuses.is_empty() {
            return Err(DataflowError::configuration(
                "run_stats.statuses must name at least one status",
            ));
        }

        if self.logs.page_size == 0 {
            return Err(DataflowError::configuration(
                "logs.page_size must be greater than 0",
            ));
        }

        Ok(())
    }
}
