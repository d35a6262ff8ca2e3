//! # Flow-Run Log Pagination
//!
//! The proxy serves flow-run logs one page at a time. [`fetch_all_logs`] walks
//! the pages from offset 0 until the source returns a short or empty page.

use tracing::debug;

use crate::client::{FlowRunLogSource, HttpError};
use crate::error::Result;
use crate::logging::log_pagination_operation;
use crate::validation::{validate_flow_run_id, validate_page_size};

/// Fetch every log line of a flow run (optionally narrowed to one task run).
///
/// Lines are returned in fetch order: oldest page first, page contents as
/// served. Remote failures abort the walk and are returned unchanged.
pub async fn fetch_all_logs(
    source: &dyn FlowRunLogSource,
    flow_run_id: &str,
    task_run_id: Option<&str>,
    page_size: u32,
) -> Result<Vec<String>> {
    validate_flow_run_id(flow_run_id)?;
    validate_page_size(page_size)?;

    let mut lines = Vec::new();
    let mut offset: u32 = 0;
    let mut pages = 0usize;

    loop {
        let page = source
            .fetch_logs(flow_run_id, task_run_id, page_size, offset)
            .await?;
        pages += 1;

        let page_len = page.len();
        debug!(
            flow_run_id = %flow_run_id,
            offset = offset,
            page_len = page_len,
            "Fetched log page"
        );
        lines.extend(page);

        if page_len < page_size as usize {
            break;
        }
        offset = next_offset(flow_run_id, offset, page_size)?;
    }

    log_pagination_operation(flow_run_id, task_run_id, pages, lines.len());
    Ok(lines)
}

/// Offset of the page after the one at `offset`; the offset must keep growing
fn next_offset(flow_run_id: &str, offset: u32, page_size: u32) -> Result<u32> {
    offset.checked_add(page_size).ok_or_else(|| {
        HttpError::invalid_response(
            format!("flow_runs/logs/{flow_run_id}"),
            format!("log offset overflow after {offset} lines"),
        )
        .into()
    })
}
