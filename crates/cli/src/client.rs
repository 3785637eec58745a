//! API client for the fleet scanner HTTP API

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// Error returned by the scanner for a non-success status
#[derive(Debug, thiserror::Error)]
#[error("API error ({status}): {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// API client for the scanner
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[]).await
    }

    /// Make a GET request with query parameters; `None` values are omitted
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<T> {
        let mut url = self.base_url.join(path).context("Invalid path")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ApiError { status, message }.into());
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn report(&self) -> Result<ReportSummary> {
        self.get("api/v1/report").await
    }

    pub async fn costs(&self, top: Option<usize>, region: Option<String>) -> Result<CostsResponse> {
        self.get_with_query(
            "api/v1/costs",
            &[("top", top.map(|t| t.to_string())), ("region", region)],
        )
        .await
    }

    pub async fn underutilized(&self) -> Result<UnderutilizedResponse> {
        self.get("api/v1/underutilized").await
    }

    pub async fn history(
        &self,
        resource_id: &str,
        kind: Option<String>,
        offset: usize,
        limit: usize,
    ) -> Result<HistoryResponse> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API URL cannot have a path"))?
            .pop_if_empty()
            .extend(["api", "v1", "resources", resource_id, "history"]);

        self.get_with_query(
            url.as_str(),
            &[
                ("kind", kind),
                ("offset", Some(offset.to_string())),
                ("limit", Some(limit.to_string())),
            ],
        )
        .await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionFailure {
    pub region: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFailure {
    pub resource_id: String,
    pub region: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub cycle_id: u64,
    pub started_at: String,
    pub finished_at: String,
    pub phase: String,
    pub duration_secs: f64,
    pub regions_scanned: Vec<String>,
    pub excluded_regions: Vec<RegionFailure>,
    pub excluded_resources: Vec<ResourceFailure>,
    pub resources_evaluated: usize,
    pub resources_without_verdict: usize,
    pub underutilized: usize,
    pub spikes: usize,
    pub persistence_failures: usize,
    pub fleet_monthly_forecast: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub hourly_rate: f64,
    pub rate_source: String,
    pub daily_forecast: f64,
    pub weekly_forecast: f64,
    pub monthly_forecast: f64,
    pub rank: String,
    pub underutilized: Option<bool>,
    pub expensive_underutilized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsResponse {
    pub cycle_id: u64,
    pub resource_count: usize,
    pub total_monthly_forecast: f64,
    pub resources: Vec<CostSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderutilizedSummary {
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub avg_cpu: f64,
    pub history_days_used: u32,
    pub monthly_forecast: f64,
    pub expensive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderutilizedResponse {
    pub cycle_id: u64,
    pub resources: Vec<UnderutilizedSummary>,
    pub report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub resource_id: String,
    pub kind: String,
    pub timestamp: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub resource_id: String,
    pub kind: String,
    pub samples: Vec<Sample>,
    pub next_offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
