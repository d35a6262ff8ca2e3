//! Copies flow runs reported by the proxy into the local run history so the
//! statistics engine can read them without a remote call.

use std::sync::Arc;

use tracing::info;

use crate::client::FlowRunSource;
use crate::database::RunHistoryStore;
use crate::error::Result;
use crate::validation::validate_deployment_id;

#[derive(Clone)]
pub struct FlowRunSyncService {
    source: Arc<dyn FlowRunSource>,
    history: Arc<dyn RunHistoryStore>,
}

impl FlowRunSyncService {
    pub fn new(source: Arc<dyn FlowRunSource>, history: Arc<dyn RunHistoryStore>) -> Self {
        Self { source, history }
    }

    /// Pull the deployment's flow runs and upsert them, returning how many
    /// records were written.
    pub async fn sync_deployment(&self, deployment_id: &str, limit: Option<u32>) -> Result<u64> {
        validate_deployment_id(deployment_id)?;

        let runs = self
            .source
            .get_flow_runs_by_deployment_id(deployment_id, limit)
            .await?;
        let recorded = self.history.record_runs(&runs).await?;

        info!(
            deployment_id = %deployment_id,
            fetched = runs.len(),
            recorded = recorded,
            "Synced flow runs into run history"
        );
        Ok(recorded)
    }
}
