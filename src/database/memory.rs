//! In-process adapters for the storage ports.
//!
//! These back the test suite and let the core run embedded without a
//! database. Semantics match the PostgreSQL adapters: newest-first ordering,
//! upsert keyed by `flow_run_id` for runs and by `deployment_id` for dataflows.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{DataflowStore, RunHistoryQuery, RunHistoryStore};
use crate::error::Result;
use crate::models::{Dataflow, RunRecord};

#[derive(Debug, Default)]
pub struct InMemoryRunHistoryStore {
    runs: RwLock<Vec<RunRecord>>,
}

impl InMemoryRunHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs(runs: Vec<RunRecord>) -> Self {
        Self {
            runs: RwLock::new(runs),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    fn upsert(&self, run: &RunRecord) {
        let mut runs = self.runs.write();
        match runs.iter_mut().find(|r| r.flow_run_id == run.flow_run_id) {
            Some(existing) => *existing = run.clone(),
            None => runs.push(run.clone()),
        }
    }
}

#[async_trait]
impl RunHistoryStore for InMemoryRunHistoryStore {
    async fn query_runs(&self, query: &RunHistoryQuery) -> Result<Vec<RunRecord>> {
        let mut matching: Vec<RunRecord> = self
            .runs
            .read()
            .iter()
            .filter(|run| query.matches(run))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.start_time
                .cmp(&a.start_time)
                .then_with(|| b.flow_run_id.cmp(&a.flow_run_id))
        });
        matching.truncate(query.limit as usize);
        Ok(matching)
    }

    async fn record_runs(&self, runs: &[RunRecord]) -> Result<u64> {
        for run in runs {
            self.upsert(run);
        }
        Ok(runs.len() as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDataflowStore {
    dataflows: DashMap<String, Dataflow>,
    saves: AtomicUsize,
}

impl InMemoryDataflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a dataflow without counting it as a save
    pub fn insert(&self, dataflow: Dataflow) {
        self.dataflows
            .insert(dataflow.deployment_id.clone(), dataflow);
    }

    pub fn get(&self, deployment_id: &str) -> Option<Dataflow> {
        self.dataflows.get(deployment_id).map(|d| d.value().clone())
    }

    /// Number of `save` calls received
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataflowStore for InMemoryDataflowStore {
    async fn find_by_deployment_id(&self, deployment_id: &str) -> Result<Option<Dataflow>> {
        Ok(self.get(deployment_id))
    }

    async fn save(&self, dataflow: &Dataflow) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.dataflows
            .insert(dataflow.deployment_id.clone(), dataflow.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FlowRunStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn run(id: &str, deployment_id: &str, days_ago: i64, status: FlowRunStatus) -> RunRecord {
        let start = Utc.with_ymd_and_hms(2024, 6, 30, 8, 0, 0).unwrap() - Duration::days(days_ago);
        RunRecord {
            deployment_id: deployment_id.into(),
            flow_run_id: id.into(),
            name: format!("run-{id}"),
            start_time: start,
            expected_start_time: start,
            total_run_time: 10.0,
            status,
            state_name: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = InMemoryRunHistoryStore::with_runs(vec![
            run("a", "dep", 3, FlowRunStatus::Completed),
            run("b", "dep", 1, FlowRunStatus::Completed),
            run("c", "dep", 0, FlowRunStatus::Failed),
            run("d", "other", 0, FlowRunStatus::Completed),
            run("e", "dep", 2, FlowRunStatus::Completed),
        ]);

        let query = RunHistoryQuery::new("dep", &[FlowRunStatus::Completed], 2);
        let runs = store.query_runs(&query).await.unwrap();

        let ids: Vec<&str> = runs.iter().map(|r| r.flow_run_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "e"]);
    }

    #[tokio::test]
    async fn test_tied_start_times_break_by_flow_run_id() {
        let mut slow = run("a", "dep", 0, FlowRunStatus::Completed);
        slow.total_run_time = 500.0;
        let mut fast = run("b", "dep", 0, FlowRunStatus::Completed);
        fast.total_run_time = 10.0;

        let query = RunHistoryQuery::new("dep", &[FlowRunStatus::Completed], 1);
        let inserted_first = InMemoryRunHistoryStore::with_runs(vec![slow.clone(), fast.clone()]);
        let inserted_last = InMemoryRunHistoryStore::with_runs(vec![fast, slow]);

        let first = inserted_first.query_runs(&query).await.unwrap();
        let last = inserted_last.query_runs(&query).await.unwrap();

        assert_eq!(first[0].flow_run_id, "b");
        assert_eq!(last[0].flow_run_id, "b");
        assert_eq!(first[0].total_run_time, 10.0);
    }

    #[tokio::test]
    async fn test_record_runs_upserts_by_flow_run_id() {
        let store = InMemoryRunHistoryStore::new();
        let mut first = run("a", "dep", 0, FlowRunStatus::Running);
        store.record_runs(&[first.clone()]).await.unwrap();

        first.status = FlowRunStatus::Completed;
        first.total_run_time = 42.0;
        store.record_runs(&[first]).await.unwrap();

        assert_eq!(store.len(), 1);
        let query = RunHistoryQuery::new("dep", &[FlowRunStatus::Completed], 10);
        let runs = store.query_runs(&query).await.unwrap();
        assert_eq!(runs[0].total_run_time, 42.0);
    }

    #[tokio::test]
    async fn test_dataflow_store_counts_saves_not_seeds() {
        let store = InMemoryDataflowStore::new();
        store.insert(Dataflow {
            dataflow_id: 1,
            name: "df".into(),
            deployment_id: "dep".into(),
            deployment_name: "dep-name".into(),
            cron: None,
            dataflow_type: "orchestrate".into(),
            meta: None,
        });
        assert_eq!(store.save_count(), 0);

        let mut dataflow = store.find_by_deployment_id("dep").await.unwrap().unwrap();
        dataflow.meta = Some(serde_json::json!({"max_run_time": 1}));
        store.save(&dataflow).await.unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.get("dep").unwrap().meta, dataflow.meta);
    }
}
