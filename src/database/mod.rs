//! # Storage Ports
//!
//! The statistics engine never talks to a database directly. It reads run
//! history and persists dataflow snapshots through the two traits defined here,
//! which keeps the computation testable without a live PostgreSQL instance.
//!
//! ## Key Components
//!
//! - [`RunHistoryStore`] - read access to historical flow runs
//! - [`DataflowStore`] - lookup and persistence of dataflows
//! - [`postgres`] - SQLx-backed adapters
//! - [`memory`] - in-process adapters for tests and embedding
//! - [`connection`] - pool setup and schema migrations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dataflow_core::config::DatabaseConfig;
//! use dataflow_core::database::{DatabaseConnection, PgDataflowStore, PgRunHistoryStore};
//! use dataflow_core::services::RunTimeStatsService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! let service = RunTimeStatsService::new(
//!     Arc::new(PgRunHistoryStore::new(db.pool().clone())),
//!     Arc::new(PgDataflowStore::new(db.pool().clone())),
//! );
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod memory;
pub mod postgres;

pub use connection::{DatabaseConnection, MIGRATOR};
pub use memory::{InMemoryDataflowStore, InMemoryRunHistoryStore};
pub use postgres::{PgDataflowStore, PgRunHistoryStore};

use async_trait::async_trait;

use crate::constants::FlowRunStatus;
use crate::error::Result;
use crate::models::{Dataflow, RunRecord};

/// Which runs to fetch from history. Results are always ordered by
/// `start_time` descending, ties broken by `flow_run_id` descending, and
/// truncated to `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHistoryQuery {
    pub deployment_id: String,
    pub statuses: Vec<FlowRunStatus>,
    pub limit: u32,
}

impl RunHistoryQuery {
    pub fn new(deployment_id: impl Into<String>, statuses: &[FlowRunStatus], limit: u32) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            statuses: statuses.to_vec(),
            limit,
        }
    }

    /// Whether a run satisfies the deployment and status filters
    pub fn matches(&self, run: &RunRecord) -> bool {
        run.deployment_id == self.deployment_id && self.statuses.contains(&run.status)
    }
}

/// Historical flow runs, owned by the orchestration side
#[async_trait]
pub trait RunHistoryStore: Send + Sync {
    /// Most recent runs matching the query, newest first
    async fn query_runs(&self, query: &RunHistoryQuery) -> Result<Vec<RunRecord>>;

    /// Upsert runs keyed by `flow_run_id`, returning how many were written
    async fn record_runs(&self, runs: &[RunRecord]) -> Result<u64>;
}

/// Dataflow lookup and `meta` persistence
#[async_trait]
pub trait DataflowStore: Send + Sync {
    async fn find_by_deployment_id(&self, deployment_id: &str) -> Result<Option<Dataflow>>;

    /// Idempotent upsert of the dataflow's `meta`
    async fn save(&self, dataflow: &Dataflow) -> Result<()>;
}
