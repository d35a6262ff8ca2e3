use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{FlowRunLogSource, FlowRunSource, HttpError};
use crate::config::ProxyConfig;
use crate::constants::{FlowRunStatus, ORG_HEADER};
use crate::error::{DataflowError, Result};
use crate::models::RunRecord;
use crate::validation::{validate_deployment_id, validate_path_segment};

/// Result of a raw proxy call
pub type ClientResult<T> = std::result::Result<T, HttpError>;

/// HTTP client for the Prefect proxy.
///
/// Every call hits `{base_url}/proxy/{endpoint}` with the organization header
/// set. Failures are mapped to [`HttpError`] and never retried here.
#[derive(Debug, Clone)]
pub struct PrefectProxyClient {
    client: Client,
    base_url: Url,
    org_slug: Option<String>,
    timeout: Duration,
    flow_runs_timeout: Duration,
}

/// Flow run as the proxy reports it
#[derive(Debug, Deserialize)]
struct ProxyFlowRun {
    id: String,
    name: String,
    #[serde(rename = "startTime", default)]
    start_time: Option<String>,
    #[serde(rename = "expectedStartTime", default)]
    expected_start_time: Option<String>,
    #[serde(rename = "totalRunTime", default)]
    total_run_time: f64,
    status: String,
    #[serde(default)]
    state_name: Option<String>,
}

impl PrefectProxyClient {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            DataflowError::configuration(format!("Invalid proxy base URL '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .user_agent(format!("dataflow-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataflowError::configuration(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %base_url,
            timeout_seconds = config.timeout_seconds,
            org_slug = config.org_slug.as_deref().unwrap_or(""),
            "Created Prefect proxy client"
        );

        Ok(Self {
            client,
            base_url,
            org_slug: config.org_slug.clone(),
            timeout: config.timeout(),
            flow_runs_timeout: config.flow_runs_timeout(),
        })
    }

    /// Same client, acting on behalf of another organization
    pub fn with_org(&self, org_slug: impl Into<String>) -> Self {
        Self {
            org_slug: Some(org_slug.into()),
            ..self.clone()
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/proxy/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        let url = self.endpoint_url(endpoint);
        debug!(method = %method, url = %url, "Proxy request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ORG_HEADER, self.org_slug.as_deref().unwrap_or(""))
            .timeout(timeout.unwrap_or(self.timeout));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            error!(method = %method, url = %url, error = %e, "Proxy connection failed");
            HttpError::Connection(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(method = %method, url = %url, status = %status, error = %body, "Proxy request failed");
            return Err(HttpError::status(status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(HttpError::Connection)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| HttpError::invalid_response(endpoint, e.to_string()))
    }

    pub async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        self.send(Method::GET, endpoint, query, None, timeout).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        self.send(Method::POST, endpoint, &[], Some(payload), timeout)
            .await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> ClientResult<Value> {
        self.send(Method::PUT, endpoint, &[], Some(payload), timeout)
            .await
    }

    pub async fn delete(&self, endpoint: &str, timeout: Option<Duration>) -> ClientResult<Value> {
        self.send(Method::DELETE, endpoint, &[], None, timeout).await
    }

    // ===================================================================================
    // FLOW RUNS
    // ===================================================================================

    /// One page of logs for a flow run, optionally narrowed to a task run
    pub async fn get_flow_run_logs(
        &self,
        flow_run_id: &str,
        task_run_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<String>> {
        validate_path_segment("flow_run_id", flow_run_id)?;

        let mut query = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
        if let Some(task_run_id) = task_run_id {
            query.push(("task_run_id", task_run_id.to_string()));
        }

        let endpoint = format!("flow_runs/logs/{flow_run_id}");
        let response = self.get(&endpoint, &query, None).await?;

        let logs = response
            .get("logs")
            .and_then(Value::as_array)
            .ok_or_else(|| HttpError::invalid_response(&endpoint, "missing 'logs' array"))?;

        Ok(logs
            .iter()
            .map(|line| match line {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect())
    }

    pub async fn get_flow_run(&self, flow_run_id: &str) -> Result<Value> {
        validate_path_segment("flow_run_id", flow_run_id)?;
        Ok(self
            .get(&format!("flow_runs/{flow_run_id}"), &[], None)
            .await?)
    }

    /// Flow runs of a deployment, newest first as the proxy returns them
    pub async fn get_flow_runs_by_deployment_id(
        &self,
        deployment_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RunRecord>> {
        validate_deployment_id(deployment_id)?;

        let mut query = vec![("deployment_id", deployment_id.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .get("flow_runs", &query, Some(self.flow_runs_timeout))
            .await?;
        let flow_runs = response
            .get("flow_runs")
            .cloned()
            .ok_or_else(|| HttpError::invalid_response("flow_runs", "missing 'flow_runs' array"))?;
        let flow_runs: Vec<ProxyFlowRun> = serde_json::from_value(flow_runs)
            .map_err(|e| HttpError::invalid_response("flow_runs", e.to_string()))?;

        flow_runs
            .into_iter()
            .map(|flow_run| to_run_record(deployment_id, flow_run))
            .collect()
    }

    // ===================================================================================
    // DEPLOYMENTS
    // ===================================================================================

    pub async fn get_deployment(&self, deployment_id: &str) -> Result<Value> {
        validate_path_segment("deployment_id", deployment_id)?;
        Ok(self
            .get(&format!("deployments/{deployment_id}"), &[], None)
            .await?)
    }

    /// Trigger an ad-hoc run of a deployment
    pub async fn create_deployment_flow_run(&self, deployment_id: &str) -> Result<Value> {
        validate_path_segment("deployment_id", deployment_id)?;
        Ok(self
            .post(&format!("deployments/{deployment_id}/flow_run"), &json!({}), None)
            .await?)
    }

    /// Switch a deployment's schedule, e.g. `active` / `inactive`
    pub async fn set_deployment_schedule(&self, deployment_id: &str, status: &str) -> Result<Value> {
        validate_path_segment("deployment_id", deployment_id)?;
        validate_path_segment("status", status)?;
        Ok(self
            .post(
                &format!("deployments/{deployment_id}/set_schedule/{status}"),
                &json!({}),
                None,
            )
            .await?)
    }

    pub async fn get_filtered_deployments(
        &self,
        org_slug: &str,
        deployment_ids: &[String],
    ) -> Result<Vec<Value>> {
        let payload = json!({
            "org_slug": org_slug,
            "deployment_ids": deployment_ids,
        });
        let response = self.post("deployments/filter", &payload, None).await?;

        match response.get("deployments") {
            Some(Value::Array(deployments)) => Ok(deployments.clone()),
            _ => Err(HttpError::invalid_response("deployments/filter", "missing 'deployments' array").into()),
        }
    }

    pub async fn delete_deployment_by_id(&self, deployment_id: &str) -> Result<()> {
        validate_path_segment("deployment_id", deployment_id)?;
        self.delete(&format!("deployments/{deployment_id}"), None)
            .await?;
        Ok(())
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize a proxy flow run; a missing start falls back to the expected start
fn to_run_record(deployment_id: &str, flow_run: ProxyFlowRun) -> Result<RunRecord> {
    let expected_start_time = parse_timestamp(flow_run.expected_start_time.as_deref());
    let start_time = parse_timestamp(flow_run.start_time.as_deref())
        .or(expected_start_time)
        .ok_or_else(|| {
            HttpError::invalid_response(
                "flow_runs",
                format!("flow run {} has no usable start time", flow_run.id),
            )
        })?;

    let status: FlowRunStatus = flow_run
        .status
        .parse()
        .map_err(|e: String| HttpError::invalid_response("flow_runs", e))?;

    Ok(RunRecord {
        deployment_id: deployment_id.to_string(),
        flow_run_id: flow_run.id,
        name: flow_run.name,
        start_time,
        expected_start_time: expected_start_time.unwrap_or(start_time),
        total_run_time: flow_run.total_run_time,
        state_name: flow_run.state_name.unwrap_or_else(|| status.to_string()),
        status,
    })
}

#[async_trait]
impl FlowRunLogSource for PrefectProxyClient {
    async fn fetch_logs(
        &self,
        flow_run_id: &str,
        task_run_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<String>> {
        self.get_flow_run_logs(flow_run_id, task_run_id, limit, offset)
            .await
    }
}

#[async_trait]
impl FlowRunSource for PrefectProxyClient {
    async fn get_flow_runs_by_deployment_id(
        &self,
        deployment_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RunRecord>> {
        PrefectProxyClient::get_flow_runs_by_deployment_id(self, deployment_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn flow_run(start: Option<&str>, expected: Option<&str>) -> ProxyFlowRun {
        ProxyFlowRun {
            id: "flowrunid".into(),
            name: "flowrunname".into(),
            start_time: start.map(str::to_string),
            expected_start_time: expected.map(str::to_string),
            total_run_time: 10.0,
            status: "COMPLETED".into(),
            state_name: Some("COMPLETED".into()),
        }
    }

    #[test]
    fn test_client_creation_and_endpoint_urls() {
        let config = ProxyConfig {
            base_url: "http://localhost:8085/".into(),
            ..ProxyConfig::default()
        };
        let client = PrefectProxyClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint_url("flow_runs/abc"),
            "http://localhost:8085/proxy/flow_runs/abc"
        );
        assert_eq!(client.with_org("acme").org_slug.as_deref(), Some("acme"));
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let config = ProxyConfig {
            base_url: "not a url".into(),
            ..ProxyConfig::default()
        };
        assert!(matches!(
            PrefectProxyClient::new(&config),
            Err(DataflowError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_empty_start_time_falls_back_to_expected() {
        let record = to_run_record(
            "depid1",
            flow_run(Some(""), Some("2021-01-01T00:00:00.000Z")),
        )
        .unwrap();

        let expected = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(record.deployment_id, "depid1");
        assert_eq!(record.start_time, expected);
        assert_eq!(record.expected_start_time, expected);
        assert_eq!(record.start_time.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert_eq!(record.status, FlowRunStatus::Completed);
    }

    #[test]
    fn test_offset_timestamps_are_normalized_to_utc() {
        let record = to_run_record(
            "depid1",
            flow_run(Some("2021-01-01T05:30:00+05:30"), None),
        )
        .unwrap();
        assert_eq!(record.start_time, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.expected_start_time, record.start_time);
    }

    #[test]
    fn test_missing_timestamps_are_rejected() {
        let err = to_run_record("depid1", flow_run(None, Some(""))).unwrap_err();
        assert!(matches!(err, DataflowError::RemoteError(HttpError::InvalidResponse { .. })));
    }
}
