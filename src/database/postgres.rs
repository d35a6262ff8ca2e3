//! PostgreSQL adapters for the storage ports.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{DataflowStore, RunHistoryQuery, RunHistoryStore};
use crate::error::Result;
use crate::models::{Dataflow, RunRecord};

/// Run history backed by the `prefect_flow_runs` table
#[derive(Debug, Clone)]
pub struct PgRunHistoryStore {
    pool: PgPool,
}

impl PgRunHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunHistoryStore for PgRunHistoryStore {
    async fn query_runs(&self, query: &RunHistoryQuery) -> Result<Vec<RunRecord>> {
        let runs = RunRecord::find_recent_by_deployment(
            &self.pool,
            &query.deployment_id,
            &query.statuses,
            query.limit,
        )
        .await?;

        debug!(
            deployment_id = %query.deployment_id,
            returned = runs.len(),
            limit = query.limit,
            "Queried run history"
        );
        Ok(runs)
    }

    async fn record_runs(&self, runs: &[RunRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for run in runs {
            RunRecord::upsert(&mut *tx, run).await?;
        }
        tx.commit().await?;

        Ok(runs.len() as u64)
    }
}

/// Dataflows backed by the `org_dataflows` table
#[derive(Debug, Clone)]
pub struct PgDataflowStore {
    pool: PgPool,
}

impl PgDataflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataflowStore for PgDataflowStore {
    async fn find_by_deployment_id(&self, deployment_id: &str) -> Result<Option<Dataflow>> {
        Ok(Dataflow::find_by_deployment_id(&self.pool, deployment_id).await?)
    }

    async fn save(&self, dataflow: &Dataflow) -> Result<()> {
        dataflow.save(&self.pool).await?;
        Ok(())
    }
}
