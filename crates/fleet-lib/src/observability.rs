//! Observability infrastructure for the fleet scanner
//!
//! Provides:
//! - Prometheus metrics (cycle duration, collaborator latency, fleet counts, rate cache)
//! - Structured JSON logging with tracing

use crate::error::Collaborator;
use crate::models::{CostProjection, EvaluationResult};
use prometheus::{
    register_gauge, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, Histogram, HistogramVec, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for collaborator calls (in seconds)
const CALL_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Histogram buckets for whole scan cycles (in seconds)
const CYCLE_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScannerMetricsInner> = OnceLock::new();

struct ScannerMetricsInner {
    cycle_duration_seconds: Histogram,
    collaborator_latency_seconds: HistogramVec,
    collaborator_errors: IntCounterVec,
    regions_scanned: IntGauge,
    regions_excluded: IntGauge,
    resources_evaluated: IntGauge,
    resources_excluded: IntGauge,
    underutilized_resources: IntGauge,
    spikes_detected: IntCounter,
    persistence_failures: IntCounter,
    rate_cache_lookups: IntCounterVec,
    fleet_monthly_forecast: Gauge,
    cycles_completed: IntCounter,
}

impl ScannerMetricsInner {
    fn new() -> Self {
        Self {
            cycle_duration_seconds: register_histogram!(
                "fleet_scanner_cycle_duration_seconds",
                "Wall-clock duration of a full scan cycle",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            collaborator_latency_seconds: register_histogram_vec!(
                "fleet_scanner_collaborator_latency_seconds",
                "Latency of calls to external collaborators",
                &["collaborator"],
                CALL_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register collaborator_latency_seconds"),

            collaborator_errors: register_int_counter_vec!(
                "fleet_scanner_collaborator_errors_total",
                "Failed or timed-out collaborator calls",
                &["collaborator"]
            )
            .expect("Failed to register collaborator_errors"),

            regions_scanned: register_int_gauge!(
                "fleet_scanner_regions_scanned",
                "Regions successfully scanned in the last cycle"
            )
            .expect("Failed to register regions_scanned"),

            regions_excluded: register_int_gauge!(
                "fleet_scanner_regions_excluded",
                "Regions excluded from the last cycle"
            )
            .expect("Failed to register regions_excluded"),

            resources_evaluated: register_int_gauge!(
                "fleet_scanner_resources_evaluated",
                "Resources evaluated in the last cycle"
            )
            .expect("Failed to register resources_evaluated"),

            resources_excluded: register_int_gauge!(
                "fleet_scanner_resources_excluded",
                "Resources excluded from the last cycle"
            )
            .expect("Failed to register resources_excluded"),

            underutilized_resources: register_int_gauge!(
                "fleet_scanner_underutilized_resources",
                "Resources flagged underutilized in the last cycle"
            )
            .expect("Failed to register underutilized_resources"),

            spikes_detected: register_int_counter!(
                "fleet_scanner_cpu_spikes_detected_total",
                "Total number of CPU spikes detected"
            )
            .expect("Failed to register spikes_detected"),

            persistence_failures: register_int_counter!(
                "fleet_scanner_persistence_failures_total",
                "Records that could not be persisted after retries"
            )
            .expect("Failed to register persistence_failures"),

            rate_cache_lookups: register_int_counter_vec!(
                "fleet_scanner_rate_cache_lookups_total",
                "Rate cache lookups by result",
                &["result"]
            )
            .expect("Failed to register rate_cache_lookups"),

            fleet_monthly_forecast: register_gauge!(
                "fleet_scanner_monthly_forecast_dollars",
                "Projected monthly spend across the scanned fleet"
            )
            .expect("Failed to register fleet_monthly_forecast"),

            cycles_completed: register_int_counter!(
                "fleet_scanner_cycles_completed_total",
                "Total number of completed scan cycles"
            )
            .expect("Failed to register cycles_completed"),
        }
    }
}

/// Scanner metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone, Debug)]
pub struct ScannerMetrics {
    _private: (),
}

impl Default for ScannerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScannerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScannerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScannerMetricsInner::new)
    }

    pub fn observe_cycle_duration(&self, duration_secs: f64) {
        self.inner().cycle_duration_seconds.observe(duration_secs);
    }

    pub fn observe_collaborator_latency(&self, collaborator: Collaborator, duration_secs: f64) {
        self.inner()
            .collaborator_latency_seconds
            .with_label_values(&[&collaborator.to_string()])
            .observe(duration_secs);
    }

    pub fn inc_collaborator_errors(&self, collaborator: Collaborator) {
        self.inner()
            .collaborator_errors
            .with_label_values(&[&collaborator.to_string()])
            .inc();
    }

    /// Publish the per-cycle gauges
    pub fn set_cycle_counts(
        &self,
        regions_scanned: usize,
        regions_excluded: usize,
        resources_evaluated: usize,
        resources_excluded: usize,
        underutilized: usize,
    ) {
        let inner = self.inner();
        inner.regions_scanned.set(regions_scanned as i64);
        inner.regions_excluded.set(regions_excluded as i64);
        inner.resources_evaluated.set(resources_evaluated as i64);
        inner.resources_excluded.set(resources_excluded as i64);
        inner.underutilized_resources.set(underutilized as i64);
        inner.cycles_completed.inc();
    }

    pub fn inc_spikes_detected(&self) {
        self.inner().spikes_detected.inc();
    }

    pub fn inc_persistence_failures(&self) {
        self.inner().persistence_failures.inc();
    }

    pub fn record_rate_lookup(&self, hit: bool) {
        let label = if hit { "hit" } else { "miss" };
        self.inner()
            .rate_cache_lookups
            .with_label_values(&[label])
            .inc();
    }

    pub fn set_fleet_monthly_forecast(&self, dollars: f64) {
        self.inner().fleet_monthly_forecast.set(dollars);
    }
}

/// Structured logger for scanner events
///
/// Emits event-tagged records so log pipelines can filter on `event`.
#[derive(Clone, Debug)]
pub struct StructuredLogger {
    scanner_id: String,
}

impl StructuredLogger {
    pub fn new(scanner_id: impl Into<String>) -> Self {
        Self {
            scanner_id: scanner_id.into(),
        }
    }

    pub fn log_startup(&self, version: &str, regions: &[String], interval_secs: u64) {
        info!(
            event = "scanner_started",
            scanner = %self.scanner_id,
            scanner_version = %version,
            regions = ?regions,
            interval_secs = interval_secs,
            "Fleet scanner started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scanner_shutdown",
            scanner = %self.scanner_id,
            reason = %reason,
            "Fleet scanner shutting down"
        );
    }

    pub fn log_cycle_complete(
        &self,
        cycle_id: u64,
        resources: usize,
        excluded_regions: usize,
        excluded_resources: usize,
        persistence_failures: usize,
        duration_secs: f64,
    ) {
        if excluded_regions > 0 || persistence_failures > 0 {
            warn!(
                event = "scan_cycle_complete",
                scanner = %self.scanner_id,
                cycle_id = cycle_id,
                resources = resources,
                excluded_regions = excluded_regions,
                excluded_resources = excluded_resources,
                persistence_failures = persistence_failures,
                duration_secs = duration_secs,
                "Scan cycle completed with partial results"
            );
        } else {
            info!(
                event = "scan_cycle_complete",
                scanner = %self.scanner_id,
                cycle_id = cycle_id,
                resources = resources,
                excluded_resources = excluded_resources,
                duration_secs = duration_secs,
                "Scan cycle completed"
            );
        }
    }

    pub fn log_region_excluded(&self, region: &str, reason: &str) {
        warn!(
            event = "region_excluded",
            scanner = %self.scanner_id,
            region = %region,
            reason = %reason,
            "Region excluded from scan cycle"
        );
    }

    pub fn log_underutilized(&self, result: &EvaluationResult, projection: Option<&CostProjection>) {
        info!(
            event = "underutilized_resource",
            scanner = %self.scanner_id,
            resource_id = %result.resource_id,
            region = %result.region,
            resource_type = %result.resource_type,
            avg_cpu = result.avg_cpu,
            history_days = result.history_days_used,
            monthly_forecast = ?projection.map(|p| p.monthly_forecast),
            "Underutilized resource"
        );
    }

    pub fn log_cpu_spike(&self, result: &EvaluationResult) {
        warn!(
            event = "cpu_spike_detected",
            scanner = %self.scanner_id,
            resource_id = %result.resource_id,
            region = %result.region,
            current_cpu = result.current_cpu,
            previous_avg_cpu = result.previous_avg_cpu,
            severity = "high",
            "CPU spike detected"
        );
    }

    pub fn log_persistence_failed(&self, resource_id: &str, attempts: u32, error: &str) {
        warn!(
            event = "persistence_failed",
            scanner = %self.scanner_id,
            resource_id = %resource_id,
            attempts = attempts,
            error = %error,
            "Giving up on persisting record"
        );
    }
}
