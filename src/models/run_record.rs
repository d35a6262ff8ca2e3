use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::constants::FlowRunStatus;

/// RunRecord is one historical execution of a dataflow's deployment
/// Maps to `prefect_flow_runs` table
///
/// Rows are written when flow runs are synced from the proxy and are never
/// modified or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RunRecord {
    pub deployment_id: String,
    pub flow_run_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub expected_start_time: DateTime<Utc>,
    /// Seconds, as reported by the orchestrator
    pub total_run_time: f64,
    #[sqlx(try_from = "String")]
    pub status: FlowRunStatus,
    pub state_name: String,
}

impl TryFrom<String> for FlowRunStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl RunRecord {
    /// Calendar date (UTC) the run started on
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Upsert a run keyed by `flow_run_id`
    pub async fn upsert<'e, E>(executor: E, run: &RunRecord) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO prefect_flow_runs
                (deployment_id, flow_run_id, name, start_time, expected_start_time,
                 total_run_time, status, state_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (flow_run_id) DO UPDATE SET
                name = EXCLUDED.name,
                start_time = EXCLUDED.start_time,
                expected_start_time = EXCLUDED.expected_start_time,
                total_run_time = EXCLUDED.total_run_time,
                status = EXCLUDED.status,
                state_name = EXCLUDED.state_name
            "#,
        )
        .bind(&run.deployment_id)
        .bind(&run.flow_run_id)
        .bind(&run.name)
        .bind(run.start_time)
        .bind(run.expected_start_time)
        .bind(run.total_run_time)
        .bind(run.status.as_str())
        .bind(&run.state_name)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Most recent runs for a deployment in any of the given states
    pub async fn find_recent_by_deployment(
        pool: &PgPool,
        deployment_id: &str,
        statuses: &[FlowRunStatus],
        limit: u32,
    ) -> Result<Vec<RunRecord>, sqlx::Error> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query_as::<_, RunRecord>(
            r#"
            SELECT deployment_id, flow_run_id, name, start_time, expected_start_time,
                   total_run_time, status, state_name
            FROM prefect_flow_runs
            WHERE deployment_id = $1
              AND status = ANY($2)
            ORDER BY start_time DESC, flow_run_id DESC
            LIMIT $3
            "#,
        )
        .bind(deployment_id)
        .bind(statuses)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await
    }
}
