//! Proptest strategies for run history

#![allow(dead_code)]

use proptest::prelude::*;

use super::builders::RunRecordBuilder;
use dataflow_core::{FlowRunStatus, RunRecord};

/// Durations in seconds, in quarter-second steps so sums stay exact
pub fn run_time_strategy() -> impl Strategy<Value = f64> {
    (0u32..100_000, 0u32..4).prop_map(|(whole, quarters)| whole as f64 + quarters as f64 * 0.25)
}

/// Arbitrary fractional durations, down to sub-microsecond precision
pub fn fractional_run_time_strategy() -> impl Strategy<Value = f64> {
    0.0f64..100_000.0
}

/// One completed run somewhere in the last 30 days
pub fn run_record_strategy() -> impl Strategy<Value = RunRecord> {
    run_record_with(run_time_strategy())
}

/// Like `run_record_strategy`, with durations drawn from `durations`
pub fn run_record_with(
    durations: impl Strategy<Value = f64>,
) -> impl Strategy<Value = RunRecord> {
    (0i64..30, durations).prop_map(|(days_ago, seconds)| {
        RunRecordBuilder::new()
            .days_ago(days_ago)
            .run_time(seconds)
            .status(FlowRunStatus::Completed)
            .build()
    })
}

pub fn run_history_strategy(max_len: usize) -> impl Strategy<Value = Vec<RunRecord>> {
    prop::collection::vec(run_record_strategy(), 1..=max_len)
}

pub fn fractional_run_history_strategy(max_len: usize) -> impl Strategy<Value = Vec<RunRecord>> {
    prop::collection::vec(run_record_with(fractional_run_time_strategy()), 1..=max_len)
}
