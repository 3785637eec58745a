//! HTTP API for health checks, Prometheus metrics and scan results

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use fleet_lib::{
    alert::AlertFormatter,
    cost::{is_expensive_underutilized, rank_by_impact, total_monthly},
    health::{ComponentStatus, HealthRegistry},
    history::MetricsHistoryStore,
    observability::ScannerMetrics,
    scan::{RegionFailure, ResourceFailure, ScanPhase, ScanReport},
    CostImpactRank, CostProjection, MetricKind, MetricSample, RateSource,
};
use prometheus::{Encoder, TextEncoder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

const DEFAULT_TOP: usize = 10;
const DEFAULT_HISTORY_LIMIT: usize = 500;
const MAX_HISTORY_LIMIT: usize = 5000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: ScannerMetrics,
    pub history: Arc<dyn MetricsHistoryStore>,
    latest_report: Arc<RwLock<Option<Arc<ScanReport>>>>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: ScannerMetrics,
        history: Arc<dyn MetricsHistoryStore>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            history,
            latest_report: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the report served by the result endpoints
    pub async fn publish_report(&self, report: Arc<ScanReport>) {
        *self.latest_report.write().await = Some(report);
    }

    pub async fn latest_report(&self) -> Option<Arc<ScanReport>> {
        self.latest_report.read().await.clone()
    }

    async fn require_report(&self) -> Result<Arc<ScanReport>, ApiError> {
        self.latest_report()
            .await
            .ok_or_else(|| ApiError::not_found("No scan cycle completed yet"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn money(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// Projection with money as plain numbers, for API and CLI consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub hourly_rate: f64,
    pub rate_source: RateSource,
    pub daily_forecast: f64,
    pub weekly_forecast: f64,
    pub monthly_forecast: f64,
    pub rank: CostImpactRank,
    pub underutilized: Option<bool>,
    pub expensive_underutilized: bool,
}

impl From<&CostProjection> for CostSummary {
    fn from(p: &CostProjection) -> Self {
        Self {
            resource_id: p.resource_id.clone(),
            region: p.region.clone(),
            resource_type: p.resource_type.clone(),
            hourly_rate: money(p.hourly_rate),
            rate_source: p.rate_source,
            daily_forecast: money(p.daily_forecast),
            weekly_forecast: money(p.weekly_forecast),
            monthly_forecast: money(p.monthly_forecast),
            rank: p.rank,
            underutilized: p.underutilized,
            expensive_underutilized: is_expensive_underutilized(p),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub cycle_id: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phase: ScanPhase,
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

impl From<&ScanReport> for ReportSummary {
    fn from(report: &ScanReport) -> Self {
        let evaluated = report.results().count();
        Self {
            cycle_id: report.cycle_id,
            started_at: report.started_at,
            finished_at: report.finished_at,
            phase: report.phase,
            duration_secs: report.duration_secs(),
            regions_scanned: report.regions_scanned.clone(),
            excluded_regions: report.excluded_regions.clone(),
            excluded_resources: report.excluded_resources.clone(),
            resources_evaluated: evaluated,
            resources_without_verdict: report.outcomes.len() - evaluated,
            underutilized: report.underutilized().count(),
            spikes: report.spikes().count(),
            persistence_failures: report.persistence_failures,
            fleet_monthly_forecast: money(total_monthly(&report.projections())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CostsQuery {
    pub top: Option<usize>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsResponse {
    pub cycle_id: u64,
    /// Resources matching the filter, before `top` is applied
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
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderutilizedResponse {
    pub cycle_id: u64,
    pub resources: Vec<UnderutilizedSummary>,
    /// Rendered report text
    pub report: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub kind: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub resource_id: String,
    pub kind: MetricKind,
    pub samples: Vec<MetricSample>,
    pub next_offset: Option<usize>,
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Partial results are still served
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn report(State(state): State<Arc<AppState>>) -> Result<Json<ReportSummary>, ApiError> {
    let report = state.require_report().await?;
    Ok(Json(ReportSummary::from(report.as_ref())))
}

/// Ranked projections, optionally limited to one region
async fn costs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CostsQuery>,
) -> Result<Json<CostsResponse>, ApiError> {
    let report = state.require_report().await?;

    let mut projections: Vec<CostProjection> = report
        .projections()
        .into_iter()
        .filter(|p| query.region.as_deref().map_or(true, |r| p.region == r))
        .collect();
    rank_by_impact(&mut projections);

    let top = query.top.unwrap_or(DEFAULT_TOP);
    Ok(Json(CostsResponse {
        cycle_id: report.cycle_id,
        resource_count: projections.len(),
        total_monthly_forecast: money(total_monthly(&projections)),
        resources: projections.iter().take(top).map(CostSummary::from).collect(),
    }))
}

async fn underutilized(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UnderutilizedResponse>, ApiError> {
    let report = state.require_report().await?;
    let outcomes: Vec<_> = report.underutilized().collect();

    let mut resources: Vec<UnderutilizedSummary> = outcomes
        .iter()
        .filter_map(|outcome| {
            let result = outcome.verdict.result()?;
            Some(UnderutilizedSummary {
                resource_id: result.resource_id.clone(),
                region: result.region.clone(),
                resource_type: result.resource_type.clone(),
                avg_cpu: result.avg_cpu,
                history_days_used: result.history_days_used,
                monthly_forecast: money(outcome.projection.monthly_forecast),
                expensive: is_expensive_underutilized(&outcome.projection),
                recommendation: result.recommendation.clone(),
            })
        })
        .collect();
    resources.sort_by(|a, b| {
        b.monthly_forecast
            .total_cmp(&a.monthly_forecast)
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });

    Ok(Json(UnderutilizedResponse {
        cycle_id: report.cycle_id,
        resources,
        report: AlertFormatter::new().underutilized_report(&outcomes),
    }))
}

/// Paged history of one series (CPU by default)
async fn resource_history(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(raw) => raw.parse::<MetricKind>().map_err(ApiError::bad_request)?,
        None => MetricKind::CpuUtilization,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let page = state
        .history
        .history_page(&resource_id, kind, query.offset.unwrap_or(0), limit);

    Ok(Json(HistoryResponse {
        resource_id,
        kind,
        samples: page.samples,
        next_offset: page.next_offset,
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/report", get(report))
        .route("/api/v1/costs", get(costs))
        .route("/api/v1/underutilized", get(underutilized))
        .route("/api/v1/resources/:id/history", get(resource_history))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
