//! # Dataflow Stats CLI
//!
//! Operator tool for computing a dataflow's run-time statistics, syncing its
//! flow-run history from the proxy, and dumping flow-run logs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dataflow_core::config::ConfigManager;
use dataflow_core::database::{DatabaseConnection, PgDataflowStore, PgRunHistoryStore};
use dataflow_core::logging::init_structured_logging;
use dataflow_core::services::{
    fetch_all_logs, FlowRunSyncService, RunTimeStatsOptions, RunTimeStatsService,
};
use dataflow_core::{FlowRunStatus, PrefectProxyClient};

#[derive(Parser, Debug)]
#[command(name = "dataflow-stats")]
#[command(about = "Run-time statistics and log access for Prefect-backed dataflows")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: config/dataflow.* if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute and store run-time statistics for a deployment's dataflow
    Compute {
        #[arg(long)]
        deployment_id: String,

        /// Most recent qualifying runs to consider
        #[arg(long)]
        limit: Option<u32>,

        /// Accepted run states (repeatable), e.g. --status COMPLETED --status FAILED
        #[arg(long = "status")]
        statuses: Vec<FlowRunStatus>,
    },

    /// Pull a deployment's flow runs from the proxy into run history
    Sync {
        #[arg(long)]
        deployment_id: String,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Print every log line of a flow run
    Logs {
        #[arg(long)]
        flow_run_id: String,

        #[arg(long)]
        task_run_id: Option<String>,

        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::load_from_file(cli.config.as_deref())
        .context("failed to load configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);

    match cli.command {
        Commands::Compute {
            deployment_id,
            limit,
            statuses,
        } => {
            let db = DatabaseConnection::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            db.migrate().await.context("failed to run migrations")?;

            let service = RunTimeStatsService::new(
                Arc::new(PgRunHistoryStore::new(db.pool().clone())),
                Arc::new(PgDataflowStore::new(db.pool().clone())),
            );
            let options = RunTimeStatsOptions::new(
                limit.unwrap_or(config.run_stats.history_limit),
                if statuses.is_empty() {
                    &config.run_stats.statuses
                } else {
                    &statuses
                },
            );

            let (_, stats) = service
                .compute_for_deployment(&deployment_id, &options)
                .await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Sync {
            deployment_id,
            limit,
        } => {
            let db = DatabaseConnection::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            db.migrate().await.context("failed to run migrations")?;

            let service = FlowRunSyncService::new(
                Arc::new(PrefectProxyClient::new(&config.proxy)?),
                Arc::new(PgRunHistoryStore::new(db.pool().clone())),
            );
            let recorded = service.sync_deployment(&deployment_id, limit).await?;
            println!("recorded {recorded} flow runs for {deployment_id}");
        }
        Commands::Logs {
            flow_run_id,
            task_run_id,
            page_size,
        } => {
            let client = PrefectProxyClient::new(&config.proxy)?;
            let lines = fetch_all_logs(
                &client,
                &flow_run_id,
                task_run_id.as_deref(),
                page_size.unwrap_or(config.logs.page_size),
            )
            .await?;
            for line in lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}
