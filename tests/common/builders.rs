//! Test data builders for run history and dataflows

#![allow(dead_code)] // Not every test binary uses every builder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use dataflow_core::database::{InMemoryDataflowStore, InMemoryRunHistoryStore};
use dataflow_core::services::RunTimeStatsService;
use dataflow_core::{Dataflow, FlowRunStatus, RunRecord};

pub const DEPLOYMENT_ID: &str = "test-deployment";

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique across processes, so rows left by earlier database runs never collide
pub fn unique_name(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{prefix}-{nanos}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Midnight UTC, `days_ago` days before today
pub fn midnight_days_ago(days_ago: i64) -> DateTime<Utc> {
    let today = Utc::now().date_naive() - Duration::days(days_ago);
    today.and_time(NaiveTime::MIN).and_utc()
}

/// Builder pattern for creating test RunRecords
pub struct RunRecordBuilder {
    deployment_id: String,
    start_time: DateTime<Utc>,
    total_run_time: f64,
    status: FlowRunStatus,
}

impl RunRecordBuilder {
    pub fn new() -> Self {
        Self {
            deployment_id: DEPLOYMENT_ID.to_string(),
            start_time: midnight_days_ago(0),
            total_run_time: 100.0,
            status: FlowRunStatus::Completed,
        }
    }

    pub fn deployment(mut self, deployment_id: &str) -> Self {
        self.deployment_id = deployment_id.to_string();
        self
    }

    pub fn days_ago(mut self, days: i64) -> Self {
        self.start_time = midnight_days_ago(days);
        self
    }

    pub fn started_at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn run_time(mut self, seconds: f64) -> Self {
        self.total_run_time = seconds;
        self
    }

    pub fn status(mut self, status: FlowRunStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> RunRecord {
        let id = unique_name("test-flow-run");
        let state_name = match self.status {
            FlowRunStatus::Completed => "Completed".to_string(),
            FlowRunStatus::Failed => "Failed".to_string(),
            other => other.to_string(),
        };
        RunRecord {
            deployment_id: self.deployment_id,
            name: id.replace("flow-run", "run"),
            flow_run_id: id,
            start_time: self.start_time,
            expected_start_time: self.start_time,
            total_run_time: self.total_run_time,
            status: self.status,
            state_name,
        }
    }
}

impl Default for RunRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn test_dataflow() -> Dataflow {
    Dataflow {
        dataflow_id: 1,
        name: "test-flow".to_string(),
        deployment_id: DEPLOYMENT_ID.to_string(),
        deployment_name: "test-flow".to_string(),
        cron: None,
        dataflow_type: "orchestrate".to_string(),
        meta: None,
    }
}

/// Stats service over in-memory stores, with handles to both stores
pub struct StatsHarness {
    pub history: Arc<InMemoryRunHistoryStore>,
    pub dataflows: Arc<InMemoryDataflowStore>,
    pub service: RunTimeStatsService,
}

impl StatsHarness {
    pub fn with_runs(runs: Vec<RunRecord>) -> Self {
        let history = Arc::new(InMemoryRunHistoryStore::with_runs(runs));
        let dataflows = Arc::new(InMemoryDataflowStore::new());
        dataflows.insert(test_dataflow());
        let service = RunTimeStatsService::new(history.clone(), dataflows.clone());
        Self {
            history,
            dataflows,
            service,
        }
    }
}
