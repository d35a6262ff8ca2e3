use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::services::run_time_stats::RunTimeStats;

/// Dataflow is a schedulable workflow backed by a Prefect deployment
/// Maps to `org_dataflows` table
///
/// `meta` holds the last run-time statistics snapshot, or `None` if statistics
/// were never computed for this dataflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Dataflow {
    pub dataflow_id: i64,
    pub name: String,
    pub deployment_id: String,
    pub deployment_name: String,
    pub cron: Option<String>,
    pub dataflow_type: String,
    pub meta: Option<serde_json::Value>,
}

/// New Dataflow for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDataflow {
    pub name: String,
    pub deployment_id: String,
    pub deployment_name: String,
    pub cron: Option<String>,
    pub dataflow_type: String,
}

impl Dataflow {
    /// Decode the statistics snapshot held in `meta`, if any
    pub fn run_time_stats(&self) -> Option<RunTimeStats> {
        self.meta
            .as_ref()
            .and_then(|meta| serde_json::from_value(meta.clone()).ok())
    }

    /// Replace `meta` with the given statistics snapshot
    pub fn set_run_time_stats(&mut self, stats: &RunTimeStats) -> Result<(), serde_json::Error> {
        self.meta = Some(serde_json::to_value(stats)?);
        Ok(())
    }

    /// Create a new dataflow
    pub async fn create(pool: &PgPool, new_dataflow: NewDataflow) -> Result<Dataflow, sqlx::Error> {
        sqlx::query_as::<_, Dataflow>(
            r#"
            INSERT INTO org_dataflows (name, deployment_id, deployment_name, cron, dataflow_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING dataflow_id, name, deployment_id, deployment_name, cron, dataflow_type, meta
            "#,
        )
        .bind(new_dataflow.name)
        .bind(new_dataflow.deployment_id)
        .bind(new_dataflow.deployment_name)
        .bind(new_dataflow.cron)
        .bind(new_dataflow.dataflow_type)
        .fetch_one(pool)
        .await
    }

    /// Find a dataflow by its deployment id
    pub async fn find_by_deployment_id(
        pool: &PgPool,
        deployment_id: &str,
    ) -> Result<Option<Dataflow>, sqlx::Error> {
        sqlx::query_as::<_, Dataflow>(
            r#"
            SELECT dataflow_id, name, deployment_id, deployment_name, cron, dataflow_type, meta
            FROM org_dataflows
            WHERE deployment_id = $1
            "#,
        )
        .bind(deployment_id)
        .fetch_optional(pool)
        .await
    }

    /// Upsert the dataflow keyed by `deployment_id`; last writer wins on `meta`
    pub async fn save(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO org_dataflows (name, deployment_id, deployment_name, cron, dataflow_type, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (deployment_id) DO UPDATE SET
                meta = EXCLUDED.meta,
                updated_at = NOW()
            "#,
        )
        .bind(&self.name)
        .bind(&self.deployment_id)
        .bind(&self.deployment_name)
        .bind(&self.cron)
        .bind(&self.dataflow_type)
        .bind(&self.meta)
        .execute(pool)
        .await?;

        Ok(())
    }
}
