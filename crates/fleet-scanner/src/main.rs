//! Fleet Scanner - periodic utilization and cost scanner
//!
//! Scans every configured region on an interval, flags underutilized and
//! spiking resources, projects their cost, and serves the latest results
//! over HTTP alongside health and Prometheus metrics.

use anyhow::{Context, Result};
use fleet_lib::{
    alert::{AlertDispatcher, LogTransport, WebhookTransport},
    cost::{CostEstimator, RateCache, StaticPricingSource},
    health::HealthRegistry,
    history::{InMemoryHistoryStore, JsonlHistoryStore, MetricsHistoryStore},
    observability::{ScannerMetrics, StructuredLogger},
    policy::PolicyEvaluator,
    scan::{
        AlertTransport, FixtureSource, JsonlPersistenceStore, ScanContext, ScanLoop,
        ScanOrchestrator, ScanReport,
    },
};
use fleet_scanner::{api, config::ScannerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCANNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long an in-flight cycle gets to wind down after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fleet-scanner");

    let config = ScannerConfig::load()?;
    info!(
        scanner_id = %config.scanner_id,
        regions = ?config.regions,
        "Scanner configured"
    );

    let health_registry = HealthRegistry::with_collaborators().await;
    let metrics = ScannerMetrics::new();
    let logger = StructuredLogger::new(&config.scanner_id);
    logger.log_startup(SCANNER_VERSION, &config.regions, config.scan_interval_secs);

    let fixture = match &config.fixture_path {
        Some(path) => FixtureSource::load(path).await?,
        None => {
            warn!("No fixture_path configured, inventory is empty");
            FixtureSource::default()
        }
    };
    info!(resources = fixture.resource_count(), "Inventory loaded");
    let fixture = Arc::new(fixture);

    let history: Arc<dyn MetricsHistoryStore> = match &config.history_path {
        Some(path) => Arc::new(
            JsonlHistoryStore::open(path)
                .with_context(|| format!("Failed to open history at {}", path.display()))?,
        ),
        None => Arc::new(InMemoryHistoryStore::new()),
    };
    let persistence = Arc::new(JsonlPersistenceStore::open(&config.persistence_dir).await?);

    let estimator = CostEstimator::new(
        Arc::new(StaticPricingSource::new(config.pricing.clone())),
        Arc::new(RateCache::new()),
        config.call_timeout(),
    )
    .with_metrics(metrics.clone());

    let ctx = ScanContext::new(
        fixture.clone(),
        fixture,
        persistence,
        history.clone(),
        PolicyEvaluator::new(config.policy.clone()),
        estimator,
    )
    .with_config(config.scan_config())
    .with_logger(logger.clone())
    .with_health(health_registry.clone());
    let orchestrator = Arc::new(ScanOrchestrator::new(ctx));

    let transport: Arc<dyn AlertTransport> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookTransport::new(url, config.call_timeout())?),
        None => Arc::new(LogTransport),
    };
    let dispatcher = AlertDispatcher::new(transport).with_dedup_window(config.alert_dedup_window());

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics.clone(),
        history,
    ));

    let (shutdown_tx, _) = broadcast::channel(1);
    let (scan_loop, reports) = ScanLoop::new(orchestrator, config.loop_config());
    let loop_handle = tokio::spawn(scan_loop.run(shutdown_tx.subscribe()));
    let consumer_handle = tokio::spawn(consume_reports(reports, app_state.clone(), dispatcher));

    // Start health, metrics and report server
    let mut api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let reason = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            "SIGINT received"
        }
        result = &mut api_handle => {
            match result {
                Ok(Ok(())) => "API server exited",
                Ok(Err(e)) => {
                    warn!(error = %e, "API server failed");
                    "API server failed"
                }
                Err(e) => {
                    warn!(error = %e, "API server task panicked");
                    "API server panicked"
                }
            }
        }
    };

    logger.log_shutdown(reason);
    let _ = shutdown_tx.send(());

    if tokio::time::timeout(SHUTDOWN_GRACE, loop_handle).await.is_err() {
        warn!("Scan loop did not stop within the grace period");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, consumer_handle).await.is_err() {
        warn!("Report consumer did not stop within the grace period");
    }
    api_handle.abort();

    info!("Shutting down");
    Ok(())
}

/// Publish each completed report and send its alerts
async fn consume_reports(
    mut reports: mpsc::Receiver<Arc<ScanReport>>,
    state: Arc<api::AppState>,
    dispatcher: AlertDispatcher,
) {
    while let Some(report) = reports.recv().await {
        if report.is_cancelled() {
            info!(cycle_id = report.cycle_id, "Discarding cancelled cycle");
            continue;
        }

        state.publish_report(report.clone()).await;

        let summary = dispatcher.dispatch(&report).await;
        info!(
            cycle_id = report.cycle_id,
            sent = summary.sent,
            suppressed = summary.suppressed,
            failed = summary.failed,
            "Alerts dispatched"
        );
    }
}
