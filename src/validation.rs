//! Input validation for the dataflow core
//!
//! Boundary checks for caller-supplied arguments. Violations are contract
//! errors and are rejected before any store or remote call is made.

use crate::constants::FlowRunStatus;
use crate::error::{DataflowError, Result};

/// Validates a deployment identifier
pub fn validate_deployment_id(deployment_id: &str) -> Result<()> {
    validate_identifier("deployment_id", deployment_id)
}

/// Validates a flow run identifier
pub fn validate_flow_run_id(flow_run_id: &str) -> Result<()> {
    validate_identifier("flow_run_id", flow_run_id)
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DataflowError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validates an identifier that is interpolated into a proxy URL path
pub fn validate_path_segment(field: &str, value: &str) -> Result<()> {
    validate_identifier(field, value)?;

    if value.contains('/') {
        return Err(DataflowError::validation(format!(
            "{field} must not contain '/': {value}"
        )));
    }
    Ok(())
}

/// Validates the number of history records to consider
pub fn validate_history_limit(limit: u32) -> Result<()> {
    if limit == 0 {
        return Err(DataflowError::validation("limit must be greater than 0"));
    }
    Ok(())
}

/// Validates the set of statuses a run must be in to qualify
pub fn validate_statuses(statuses: &[FlowRunStatus]) -> Result<()> {
    if statuses.is_empty() {
        return Err(DataflowError::validation(
            "statuses to include must name at least one status",
        ));
    }
    Ok(())
}

/// Validates a log page size
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 {
        return Err(DataflowError::validation("page_size must be greater than 0"));
    }
    Ok(())
}
