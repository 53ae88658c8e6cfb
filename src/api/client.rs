//! HTTP client for the monitoring REST API.
//!
//! The API serves snake_case rows; responses are deserialized into private
//! wire structs and mapped onto the dashboard types from `indra-types`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use indra_monitor::api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::builder()
//!         .base_url("http://localhost:8000/api")
//!         .build()?;
//!
//!     for process in client.processes(0, 20).await? {
//!         println!("{:>6} {:<20} {:.1}%", process.pid, process.name, process.cpu_usage);
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use indra_types::{
    current_timestamp_ms, Insight, InsightKind, MetricsSnapshot, NetworkInterface, Process,
    ProcessStatus, SecurityEvent, Service, Severity, SystemInfo,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ApiError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the monitoring REST API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Service liveness, served outside the API prefix.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let mut url = self.base_url.clone();
        url.set_path("/health");
        self.fetch(self.client.get(url)).await
    }

    pub async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        let info: ApiSystemInfo = self.get(&["system"]).await?;
        Ok(info.into())
    }

    pub async fn latest_metrics(&self) -> Result<MetricsSnapshot, ApiError> {
        let metrics: ApiMetrics = self.get(&["system", "metrics", "latest"]).await?;
        Ok(metrics.into())
    }

    /// Stored metrics, newest first as the API returns them.
    pub async fn metrics_history(&self, limit: u32) -> Result<Vec<MetricsSnapshot>, ApiError> {
        let url = self.endpoint(&["system", "metrics"])?;
        let rows: Vec<ApiMetrics> = self
            .fetch(self.client.get(url).query(&[("limit", limit)]))
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn processes(&self, skip: u32, limit: u32) -> Result<Vec<Process>, ApiError> {
        let url = self.endpoint(&["processes"])?;
        let list: ProcessList = self
            .fetch(self.client.get(url).query(&[("skip", skip), ("limit", limit)]))
            .await?;
        Ok(list.processes.into_iter().map(Into::into).collect())
    }

    pub async fn kill_process(&self, pid: u32) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &["processes", &pid.to_string()])
            .await
    }

    pub async fn services(&self, skip: u32, limit: u32) -> Result<Vec<Service>, ApiError> {
        let url = self.endpoint(&["services"])?;
        let list: ServiceList = self
            .fetch(self.client.get(url).query(&[("skip", skip), ("limit", limit)]))
            .await?;
        Ok(list.services)
    }

    pub async fn start_service(&self, name: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, &["services", name, "start"]).await
    }

    pub async fn stop_service(&self, name: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, &["services", name, "stop"]).await
    }

    pub async fn restart_service(&self, name: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, &["services", name, "restart"]).await
    }

    pub async fn network_interfaces(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<NetworkInterface>, ApiError> {
        let url = self.endpoint(&["network", "interfaces"])?;
        let list: InterfaceList = self
            .fetch(self.client.get(url).query(&[("skip", skip), ("limit", limit)]))
            .await?;
        Ok(list.interfaces)
    }

    pub async fn security_events(
        &self,
        query: &SecurityQuery,
    ) -> Result<Vec<SecurityEvent>, ApiError> {
        let url = self.endpoint(&["security", "events"])?;
        let list: SecurityEventList = self.fetch(self.client.get(url).query(query)).await?;
        Ok(list.events)
    }

    pub async fn resolve_security_event(&self, id: u64) -> Result<(), ApiError> {
        self.execute(Method::POST, &["security", "events", &id.to_string(), "resolve"])
            .await
    }

    pub async fn delete_security_event(&self, id: u64) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &["security", "events", &id.to_string()])
            .await
    }

    /// Current analysis with its insights mapped onto [`Insight`].
    pub async fn ai_analysis(&self) -> Result<AiAnalysis, ApiError> {
        let data: ApiAnalysis = self.get(&["ai-analysis"]).await?;
        let now = current_timestamp_ms();
        Ok(AiAnalysis {
            stats: data.stats,
            status: data.status,
            insights: data
                .insights
                .into_iter()
                .map(|i| i.into_insight(now))
                .collect(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        self.fetch(self.client.get(url)).await
    }

    async fn execute(&self, method: Method, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.endpoint(segments)?;
        self.send(self.client.request(method, url)).await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Set the API base URL (default: "http://localhost:8000/api").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let raw = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(raw));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(ApiClient { client, base_url })
    }
}

/// Filters for [`ApiClient::security_events`].
#[derive(Debug, Clone, Serialize)]
pub struct SecurityQuery {
    pub skip: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
}

impl Default for SecurityQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            severity: None,
            resolved: None,
        }
    }
}

/// Response of the liveness endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// Analysis summary served alongside the insights.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisStats {
    pub insights_generated: u64,
    pub optimizations_applied: u64,
    pub security_issues_fixed: u64,
    pub performance_gain_percentage: f64,
}

/// Progress of the running analysis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisStatus {
    pub system_scan_progress: f64,
    pub security_analysis_progress: f64,
    pub performance_check_progress: f64,
    pub optimization_scan_progress: f64,
    pub status_message: String,
}

/// Result of [`ApiClient::ai_analysis`].
#[derive(Debug, Clone, PartialEq)]
pub struct AiAnalysis {
    pub stats: AnalysisStats,
    pub status: AnalysisStatus,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ApiSystemInfo {
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    architecture: String,
    #[serde(default)]
    os_version: String,
    uptime: Option<f64>,
    #[serde(default)]
    cpu_model: String,
    #[serde(default)]
    total_memory: f64,
}

impl From<ApiSystemInfo> for SystemInfo {
    fn from(info: ApiSystemInfo) -> Self {
        SystemInfo {
            hostname: info.hostname,
            platform: info.platform,
            architecture: info.architecture,
            cpu_model: info.cpu_model,
            total_memory: info.total_memory,
            os_version: info.os_version,
            uptime: info.uptime.unwrap_or(0.0),
        }
    }
}

/// One stored metrics row.
#[derive(Debug, Deserialize)]
struct ApiMetrics {
    cpu_usage: Option<f64>,
    cpu_temperature: Option<f64>,
    cpu_frequency: Option<f64>,
    memory_usage: Option<f64>,
    memory_available: Option<f64>,
    memory_total: Option<f64>,
    disk_usage: Option<f64>,
    disk_available: Option<f64>,
    disk_total: Option<f64>,
    network_in: Option<f64>,
    network_out: Option<f64>,
}

impl From<ApiMetrics> for MetricsSnapshot {
    fn from(row: ApiMetrics) -> Self {
        let mut snapshot = MetricsSnapshot::builder()
            .timestamp_ms(current_timestamp_ms())
            .cpu_usage(row.cpu_usage.unwrap_or(0.0))
            .memory_percentage(row.memory_usage.unwrap_or(0.0))
            .disk_percentage(row.disk_usage.unwrap_or(0.0))
            .network(row.network_in.unwrap_or(0.0), row.network_out.unwrap_or(0.0))
            .build();

        snapshot.cpu.temperature = row.cpu_temperature;
        snapshot.cpu.frequency = row.cpu_frequency.unwrap_or(0.0);

        let memory_total = row.memory_total.unwrap_or(0.0);
        let memory_available = row.memory_available.unwrap_or(0.0);
        snapshot.memory.total = memory_total;
        snapshot.memory.available = memory_available;
        snapshot.memory.used = (memory_total - memory_available).max(0.0);

        let disk_total = row.disk_total.unwrap_or(0.0);
        snapshot.disk.total = disk_total;
        snapshot.disk.used = (disk_total - row.disk_available.unwrap_or(0.0)).max(0.0);

        snapshot
    }
}

#[derive(Debug, Deserialize)]
struct ProcessList {
    processes: Vec<ApiProcess>,
}

#[derive(Debug, Deserialize)]
struct ApiProcess {
    pid: u32,
    name: String,
    cpu_percent: Option<f64>,
    memory_percent: Option<f64>,
    status: Option<String>,
    #[serde(default)]
    created_at: String,
}

impl From<ApiProcess> for Process {
    fn from(row: ApiProcess) -> Self {
        let status = match row.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("running") => ProcessStatus::Running,
            Some("sleeping") | Some("idle") | Some("disk-sleep") => ProcessStatus::Sleeping,
            Some("stopped") => ProcessStatus::Stopped,
            _ => ProcessStatus::Unknown,
        };
        Process {
            pid: row.pid,
            name: row.name,
            cpu_usage: row.cpu_percent.unwrap_or(0.0),
            memory_usage: row.memory_percent.unwrap_or(0.0),
            status,
            start_time: row.created_at,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct InterfaceList {
    interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Deserialize)]
struct SecurityEventList {
    events: Vec<SecurityEvent>,
}

#[derive(Debug, Deserialize)]
struct ApiAnalysis {
    #[serde(default)]
    stats: AnalysisStats,
    #[serde(default)]
    status: AnalysisStatus,
    #[serde(default)]
    insights: Vec<ApiInsight>,
}

#[derive(Debug, Deserialize)]
struct ApiInsight {
    id: serde_json::Value,
    category: String,
    description: String,
    recommendation: String,
    severity: String,
}

impl ApiInsight {
    fn into_insight(self, timestamp_ms: u64) -> Insight {
        let id = match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let kind = InsightKind::from_category(&self.category);
        Insight {
            id: format!("ai-{}", id),
            kind,
            severity: Severity::from_name(&self.severity),
            title: insight_title(kind),
            description: self.description,
            recommendation: self.recommendation,
            confidence: 0.0,
            timestamp_ms,
            applied: false,
        }
    }
}

fn insight_title(kind: InsightKind) -> String {
    let title = match kind {
        InsightKind::Optimization => "Optimization opportunity",
        InsightKind::Security => "Security finding",
        InsightKind::Performance => "Performance finding",
        InsightKind::Maintenance => "Maintenance recommended",
    };
    title.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;

    #[test]
    fn test_builder_defaults() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(matches!(
            ApiClient::builder().base_url("not a url").build(),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(ApiClient::builder().base_url("mailto:ops@example.com").build().is_err());
    }

    #[test]
    fn test_endpoint_handles_trailing_slash_and_encoding() {
        let client = ApiClient::builder()
            .base_url("http://host:8000/api/")
            .build()
            .unwrap();
        let url = client.endpoint(&["services", "my service", "start"]).unwrap();
        assert_eq!(url.as_str(), "http://host:8000/api/services/my%20service/start");

        let client = ApiClient::builder().base_url("http://host:8000/api").build().unwrap();
        let url = client.endpoint(&["processes"]).unwrap();
        assert_eq!(url.as_str(), "http://host:8000/api/processes");
    }

    #[test]
    fn test_metrics_row_mapping() {
        let row: ApiMetrics = serde_json::from_str(
            r#"{"id": 7, "timestamp": "2024-05-01T10:00:00", "cpu_usage": 41.0,
                "memory_usage": 55.5, "memory_total": 16.0, "memory_available": 7.0,
                "disk_usage": 70.0, "disk_total": 500.0, "disk_available": 150.0,
                "network_in": 1.5, "network_out": null, "system_status": "operational"}"#,
        )
        .unwrap();
        let snapshot = MetricsSnapshot::from(row);

        assert_eq!(snapshot.cpu.usage, 41.0);
        assert_eq!(snapshot.memory.percentage, 55.5);
        assert_eq!(snapshot.memory.used, 9.0);
        assert_eq!(snapshot.disk.used, 350.0);
        assert_eq!(snapshot.network.upload_speed, 0.0);
        assert!(snapshot.timestamp_ms > 0);
        assert!(snapshot.is_plausible());
    }

    #[test]
    fn test_process_row_mapping() {
        let row: ApiProcess = serde_json::from_str(
            r#"{"id": 1, "pid": 812, "name": "nginx", "cpu_percent": 2.0,
                "memory_percent": null, "status": "Sleeping",
                "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-01T10:00:00"}"#,
        )
        .unwrap();
        let process = Process::from(row);

        assert_eq!(process.pid, 812);
        assert_eq!(process.memory_usage, 0.0);
        assert_eq!(process.status, ProcessStatus::Sleeping);
        assert_eq!(process.start_time, "2024-05-01T10:00:00");
    }

    #[test]
    fn test_insight_mapping() {
        let row: ApiInsight = serde_json::from_str(
            r#"{"id": 3, "category": "Security", "description": "Open port 23",
                "recommendation": "Disable telnet", "severity": "High"}"#,
        )
        .unwrap();
        let insight = row.into_insight(1_000);

        assert_eq!(insight.id, "ai-3");
        assert_eq!(insight.kind, InsightKind::Security);
        assert_eq!(insight.severity, Severity::High);
        assert_eq!(insight.timestamp_ms, 1_000);
    }

    #[tokio::test]
    async fn test_processes_over_http() {
        let api = MockApi::start()
            .await
            .route(
                "/api/processes",
                200,
                r#"{"processes": [{"id": 1, "pid": 42, "name": "sshd", "cpu_percent": 0.5}], "total": 1, "page": 1, "size": 100}"#,
            );
        let client = ApiClient::builder().base_url(api.base_url()).build().unwrap();

        let processes = client.processes(0, 50).await.unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].pid, 42);
        assert!(api
            .requests()
            .contains(&"GET /api/processes?skip=0&limit=50".to_string()));
    }

    #[tokio::test]
    async fn test_error_status_carries_detail() {
        let api = MockApi::start()
            .await
            .route("/api/system/metrics/latest", 404, r#"{"detail": "No metrics found"}"#);
        let client = ApiClient::builder().base_url(api.base_url()).build().unwrap();

        let err = client.latest_metrics().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("No metrics found"));
    }

    #[tokio::test]
    async fn test_health_is_outside_prefix() {
        let api = MockApi::start()
            .await
            .route("/health", 200, r#"{"status": "healthy", "service": "IndraOS Backend"}"#);
        let client = ApiClient::builder().base_url(api.base_url()).build().unwrap();

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = ApiClient::builder()
            .base_url(format!("http://{}/api", addr))
            .build()
            .unwrap();

        let err = client.system_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }
}
