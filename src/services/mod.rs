//! # Services
//!
//! Domain operations composed from the storage ports and the proxy client.

pub mod flow_run_sync;
pub mod log_pagination;
pub mod run_time_stats;

pub use flow_run_sync::FlowRunSyncService;
pub use log_pagination::fetch_all_logs;
pub use run_time_stats::{
    compute_run_time_stats, RunTimeStats, RunTimeStatsOptions, RunTimeStatsService,
};
