//! # Prefect Proxy Client
//!
//! Request/response plumbing against the local Prefect proxy, plus the two
//! ports the services consume from it:
//!
//! - [`FlowRunLogSource`] - one page of flow-run logs
//! - [`FlowRunSource`] - flow runs of a deployment, normalized to [`RunRecord`]
//!
//! Both are implemented by [`PrefectProxyClient`] and can be stubbed in tests.

pub mod error;
pub mod prefect;

pub use error::HttpError;
pub use prefect::{ClientResult, PrefectProxyClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RunRecord;

/// Paged access to flow-run logs
#[async_trait]
pub trait FlowRunLogSource: Send + Sync {
    /// Up to `limit` log lines starting at `offset`
    async fn fetch_logs(
        &self,
        flow_run_id: &str,
        task_run_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<String>>;
}

/// Flow runs recorded by the orchestrator for a deployment
#[async_trait]
pub trait FlowRunSource: Send + Sync {
    async fn get_flow_runs_by_deployment_id(
        &self,
        deployment_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RunRecord>>;
}
