//! # Run-Time Statistics
//!
//! Summarizes how long a dataflow's recent runs took so schedulers can size
//! timeouts and SLAs.
//!
//! ## Computation
//!
//! Over the most recent `limit` runs in an accepted state:
//!
//! - `max_run_time`, `min_run_time`: extremes of `total_run_time`
//! - `avg_run_time`: arithmetic mean of all runs
//! - `wt_avg_run_time`: runs are bucketed by UTC start date and averaged per
//!   date; dates are ranked oldest to newest with weights `1..=N` and the
//!   weighted mean of the per-date averages is taken
//!
//! Every figure is rounded up to the next whole second. When no run qualifies
//! all four figures are `-1` and the dataflow is not touched.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{FlowRunStatus, DEFAULT_RUN_HISTORY_LIMIT, NO_RUNS_SENTINEL};
use crate::database::{DataflowStore, RunHistoryQuery, RunHistoryStore};
use crate::error::{DataflowError, Result};
use crate::logging::log_stats_operation;
use crate::models::{Dataflow, RunRecord};
use crate::validation::{validate_deployment_id, validate_history_limit, validate_statuses};

/// Snapshot of a dataflow's run durations, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTimeStats {
    pub max_run_time: i64,
    pub min_run_time: i64,
    pub avg_run_time: i64,
    pub wt_avg_run_time: i64,
}

impl RunTimeStats {
    /// Result when no qualifying run exists
    pub const NO_RUNS: RunTimeStats = RunTimeStats {
        max_run_time: NO_RUNS_SENTINEL,
        min_run_time: NO_RUNS_SENTINEL,
        avg_run_time: NO_RUNS_SENTINEL,
        wt_avg_run_time: NO_RUNS_SENTINEL,
    };

    pub fn has_runs(&self) -> bool {
        *self != Self::NO_RUNS
    }
}

/// Which history to consider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTimeStatsOptions {
    pub limit: u32,
    pub statuses: Vec<FlowRunStatus>,
}

impl Default for RunTimeStatsOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RUN_HISTORY_LIMIT,
            statuses: vec![FlowRunStatus::Completed],
        }
    }
}

impl RunTimeStatsOptions {
    pub fn new(limit: u32, statuses: &[FlowRunStatus]) -> Self {
        Self {
            limit,
            statuses: statuses.to_vec(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_statuses(mut self, statuses: &[FlowRunStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }
}

/// Compute statistics over an already-filtered set of runs.
///
/// Pure: ordering of `runs` does not matter and nothing is persisted.
pub fn compute_run_time_stats(runs: &[RunRecord]) -> RunTimeStats {
    if runs.is_empty() {
        return RunTimeStats::NO_RUNS;
    }

    let durations = runs.iter().map(|run| run.total_run_time);
    let max = durations.clone().fold(f64::MIN, f64::max);
    let min = durations.clone().fold(f64::MAX, f64::min);
    let avg = durations.sum::<f64>() / runs.len() as f64;

    // both means lie in [min, max]; clamping drops accumulated rounding error
    let wt_avg = recency_weighted_average(runs).clamp(min, max);

    RunTimeStats {
        max_run_time: ceil_seconds(max),
        min_run_time: ceil_seconds(min),
        avg_run_time: ceil_seconds(avg.clamp(min, max)),
        wt_avg_run_time: ceil_seconds(wt_avg),
    }
}

/// Weighted mean of per-date averages, newest date weighted highest.
fn recency_weighted_average(runs: &[RunRecord]) -> f64 {
    // BTreeMap keeps dates in ascending order, so enumeration yields the rank
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for run in runs {
        let bucket = by_date.entry(run.start_date()).or_insert((0.0, 0));
        bucket.0 += run.total_run_time;
        bucket.1 += 1;
    }

    let (weighted_sum, weight_total) = by_date.values().enumerate().fold(
        (0.0, 0.0),
        |(weighted_sum, weight_total), (index, (sum, count))| {
            let weight = (index + 1) as f64;
            let date_avg = sum / *count as f64;
            (weighted_sum + weight * date_avg, weight_total + weight)
        },
    );

    weighted_sum / weight_total
}

fn ceil_seconds(seconds: f64) -> i64 {
    seconds.ceil() as i64
}

/// Computes and persists run-time statistics for dataflows.
///
/// The run history and the dataflow persistence are injected, so the service
/// owns no state of its own and two computations for the same dataflow race
/// with last-writer-wins semantics on `meta`.
#[derive(Clone)]
pub struct RunTimeStatsService {
    history: Arc<dyn RunHistoryStore>,
    dataflows: Arc<dyn DataflowStore>,
}

impl std::fmt::Debug for RunTimeStatsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunTimeStatsService").finish_non_exhaustive()
    }
}

impl RunTimeStatsService {
    pub fn new(history: Arc<dyn RunHistoryStore>, dataflows: Arc<dyn DataflowStore>) -> Self {
        Self { history, dataflows }
    }

    /// Compute statistics from the dataflow's run history and store them in
    /// `dataflow.meta`.
    ///
    /// With no qualifying runs the sentinel result is returned and neither
    /// `dataflow.meta` nor the store is touched. `dataflow.meta` only changes
    /// once the store has accepted the new snapshot.
    pub async fn compute_dataflow_run_times_from_history(
        &self,
        dataflow: &mut Dataflow,
        options: &RunTimeStatsOptions,
    ) -> Result<RunTimeStats> {
        validate_deployment_id(&dataflow.deployment_id)?;
        validate_history_limit(options.limit)?;
        validate_statuses(&options.statuses)?;

        let query = RunHistoryQuery::new(&dataflow.deployment_id, &options.statuses, options.limit);
        let runs = self.history.query_runs(&query).await?;

        debug!(
            deployment_id = %dataflow.deployment_id,
            runs = runs.len(),
            limit = options.limit,
            statuses = ?options.statuses,
            "Fetched run history for statistics"
        );

        if runs.is_empty() {
            log_stats_operation(&dataflow.deployment_id, 0, &RunTimeStats::NO_RUNS, false);
            return Ok(RunTimeStats::NO_RUNS);
        }

        let stats = compute_run_time_stats(&runs);
        let mut updated = dataflow.clone();
        updated.set_run_time_stats(&stats)?;
        self.dataflows.save(&updated).await?;
        *dataflow = updated;

        log_stats_operation(&dataflow.deployment_id, runs.len(), &stats, true);
        Ok(stats)
    }

    /// Look the dataflow up by deployment id, then compute as above.
    pub async fn compute_for_deployment(
        &self,
        deployment_id: &str,
        options: &RunTimeStatsOptions,
    ) -> Result<(Dataflow, RunTimeStats)> {
        validate_deployment_id(deployment_id)?;

        let mut dataflow = self
            .dataflows
            .find_by_deployment_id(deployment_id)
            .await?
            .ok_or_else(|| DataflowError::NotFound(format!("dataflow for deployment {deployment_id}")))?;

        let stats = self
            .compute_dataflow_run_times_from_history(&mut dataflow, options)
            .await?;
        Ok((dataflow, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn run_at(start: DateTime<Utc>, seconds: f64) -> RunRecord {
        RunRecord {
            deployment_id: "dep".into(),
            flow_run_id: format!("fr-{}-{seconds}", start.timestamp()),
            name: "run".into(),
            start_time: start,
            expected_start_time: start,
            total_run_time: seconds,
            status: FlowRunStatus::Completed,
            state_name: "Completed".into(),
        }
    }

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap() - Duration::days(offset)
    }

    #[test]
    fn test_no_runs_yields_sentinel() {
        let stats = compute_run_time_stats(&[]);
        assert_eq!(stats, RunTimeStats::NO_RUNS);
        assert!(!stats.has_runs());
        assert_eq!(stats.wt_avg_run_time, -1);
    }

    #[test]
    fn test_single_fractional_run_rounds_up() {
        let stats = compute_run_time_stats(&[run_at(day(0), 99.01)]);
        assert_eq!(
            stats,
            RunTimeStats {
                max_run_time: 100,
                min_run_time: 100,
                avg_run_time: 100,
                wt_avg_run_time: 100,
            }
        );
    }

    #[test]
    fn test_same_day_collapses_weighting_to_plain_average() {
        let stats = compute_run_time_stats(&[run_at(day(0), 100.0), run_at(day(0), 200.0)]);
        assert_eq!(stats.max_run_time, 200);
        assert_eq!(stats.min_run_time, 100);
        assert_eq!(stats.avg_run_time, 150);
        assert_eq!(stats.wt_avg_run_time, 150);
    }

    #[test]
    fn test_newer_dates_weigh_more() {
        let stats = compute_run_time_stats(&[run_at(day(0), 100.0), run_at(day(1), 200.0)]);
        assert_eq!(stats.avg_run_time, 150);
        // (2 * 100 + 1 * 200) / 3 = 133.33
        assert_eq!(stats.wt_avg_run_time, 134);
    }

    #[test]
    fn test_busy_day_counts_once_in_weighting() {
        // Three runs yesterday average to 300; today is 100.
        let runs = vec![
            run_at(day(1), 200.0),
            run_at(day(1) + Duration::hours(6), 300.0),
            run_at(day(1) + Duration::hours(12), 400.0),
            run_at(day(0), 100.0),
        ];
        let stats = compute_run_time_stats(&runs);
        assert_eq!(stats.avg_run_time, 250);
        // (2 * 100 + 1 * 300) / 3 = 166.67
        assert_eq!(stats.wt_avg_run_time, 167);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut runs: Vec<RunRecord> = (0..5).map(|i| run_at(day(i), 100.0 + i as f64)).collect();
        let forward = compute_run_time_stats(&runs);
        runs.reverse();
        assert_eq!(compute_run_time_stats(&runs), forward);
    }

    #[test]
    fn test_average_of_half_second_rounds_up_not_to_nearest() {
        let runs: Vec<RunRecord> = (0..20).map(|i| run_at(day(i), 100.0 + i as f64)).collect();
        let stats = compute_run_time_stats(&runs);
        // mean of 100..=119 is 109.5
        assert_eq!(stats.avg_run_time, 110);
    }

    #[test]
    fn test_options_builders() {
        let options = RunTimeStatsOptions::default()
            .with_limit(5)
            .with_statuses(&[FlowRunStatus::Completed, FlowRunStatus::Crashed]);
        assert_eq!(options.limit, 5);
        assert_eq!(options.statuses.len(), 2);
        assert_eq!(RunTimeStatsOptions::default().limit, 20);
    }
}
