//! # Structured Logging Module
//!
//! Environment-aware structured logging for the statistics engine, the log
//! paginator and the proxy client.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{ConfigManager, LoggingConfig};
use crate::services::run_time_stats::RunTimeStats;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` takes precedence over the configured level. An already
/// installed global subscriber is left in place.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let level = config
            .level
            .clone()
            .unwrap_or_else(|| default_log_level(&environment).to_string());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            level = %level,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Default filter directive for an environment
pub fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for a run-time statistics computation
pub fn log_stats_operation(
    deployment_id: &str,
    runs_considered: usize,
    stats: &RunTimeStats,
    persisted: bool,
) {
    tracing::info!(
        operation = "compute_run_time_stats",
        deployment_id = %deployment_id,
        runs_considered = runs_considered,
        max_run_time = stats.max_run_time,
        min_run_time = stats.min_run_time,
        avg_run_time = stats.avg_run_time,
        wt_avg_run_time = stats.wt_avg_run_time,
        persisted = persisted,
        timestamp = %Utc::now().to_rfc3339(),
        "STATS_OPERATION"
    );
}

/// Log structured data for a completed log pagination
pub fn log_pagination_operation(
    flow_run_id: &str,
    task_run_id: Option<&str>,
    pages: usize,
    lines: usize,
) {
    tracing::info!(
        operation = "fetch_all_logs",
        flow_run_id = %flow_run_id,
        task_run_id = task_run_id,
        pages = pages,
        lines = lines,
        timestamp = %Utc::now().to_rfc3339(),
        "LOG_PAGINATION"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels_per_environment() {
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("test"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_structured_logging(&config);
        init_structured_logging(&config);
    }
}
