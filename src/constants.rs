//! # System Constants
//!
//! Flow-run states as reported by the Prefect proxy, plus the operational
//! defaults shared by the statistics engine, the log paginator and the client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of most-recent qualifying runs considered for statistics
pub const DEFAULT_RUN_HISTORY_LIMIT: u32 = 20;

/// Default page size when paginating flow-run logs
pub const DEFAULT_LOG_PAGE_SIZE: u32 = 200;

/// Default request timeout against the proxy, in seconds
pub const DEFAULT_PROXY_TIMEOUT_SECONDS: u64 = 30;

/// Listing flow runs for a deployment is slow on large histories
pub const DEFAULT_FLOW_RUNS_TIMEOUT_SECONDS: u64 = 60;

/// Header carrying the organization slug on every proxy request
pub const ORG_HEADER: &str = "x-ddp-org";

/// Returned for every statistic when no qualifying run exists
pub const NO_RUNS_SENTINEL: i64 = -1;

/// State type of a flow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowRunStatus {
    Scheduled,
    Pending,
    Running,
    Paused,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Crashed,
}

impl FlowRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowRunStatus::Scheduled => "SCHEDULED",
            FlowRunStatus::Pending => "PENDING",
            FlowRunStatus::Running => "RUNNING",
            FlowRunStatus::Paused => "PAUSED",
            FlowRunStatus::Cancelling => "CANCELLING",
            FlowRunStatus::Completed => "COMPLETED",
            FlowRunStatus::Failed => "FAILED",
            FlowRunStatus::Cancelled => "CANCELLED",
            FlowRunStatus::Crashed => "CRASHED",
        }
    }
}

impl fmt::Display for FlowRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(FlowRunStatus::Scheduled),
            "PENDING" => Ok(FlowRunStatus::Pending),
            "RUNNING" => Ok(FlowRunStatus::Running),
            "PAUSED" => Ok(FlowRunStatus::Paused),
            "CANCELLING" => Ok(FlowRunStatus::Cancelling),
            "COMPLETED" => Ok(FlowRunStatus::Completed),
            "FAILED" => Ok(FlowRunStatus::Failed),
            "CANCELLED" => Ok(FlowRunStatus::Cancelled),
            "CRASHED" => Ok(FlowRunStatus::Crashed),
            other => Err(format!("Unknown flow run status: {other}")),
        }
    }
}
