//! Scan orchestrator
//!
//! Drives one scan cycle:
//! `ENUMERATING_REGIONS -> SCANNING -> MERGING -> EVALUATING -> PERSISTING -> DONE`
//!
//! Regions are scanned by one task each, bounded by `region_concurrency`.
//! Per-resource work (metric fetches, evaluation, pricing, persistence) is
//! bounded by `resource_concurrency` across the whole cycle. A region whose
//! inventory call fails or times out is excluded whole; a resource whose CPU
//! fetch fails is excluded alone. A task that panics is excluded the same
//! way. The cycle always produces a report.
//!
//! Cancellation aborts scanning and evaluation at once. Persistence writes
//! already under way get `persist_grace` to finish, so a resource is not
//! left with a snapshot and no cost record.

use super::retry::{retry_with_backoff, RetryPolicy};
use super::sources::{InventorySource, MetricsSource, PersistenceStore};
use super::{RegionFailure, ResourceFailure, ResourceOutcome, ScanPhase, ScanReport};
use crate::cost::{total_monthly, CostEstimator};
use crate::error::{bounded, Collaborator, FleetError};
use crate::health::{components, HealthRegistry};
use crate::history::MetricsHistoryStore;
use crate::models::{
    CostProjection, MetricKind, MetricSample, RateSource, ResourceCostRecord, ResourceDescriptor,
    ResourceSnapshot,
};
use crate::observability::{ScannerMetrics, StructuredLogger};
use crate::policy::PolicyEvaluator;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Regions to scan; discovered from the inventory source when empty
    pub regions: Vec<String>,
    /// Region scanned when discovery fails (default: us-east-1)
    pub default_region: String,
    /// Concurrent region tasks (default: 10)
    pub region_concurrency: usize,
    /// Concurrent per-resource tasks across the cycle (default: 16)
    pub resource_concurrency: usize,
    /// Bound on every collaborator call (default: 30 seconds)
    pub call_timeout: Duration,
    pub persistence_retry: RetryPolicy,
    /// Time in-flight persistence gets to finish after a cancel (default: 10 seconds)
    pub persist_grace: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            default_region: "us-east-1".to_string(),
            region_concurrency: 10,
            resource_concurrency: 16,
            call_timeout: Duration::from_secs(30),
            persistence_retry: RetryPolicy::default(),
            persist_grace: Duration::from_secs(10),
        }
    }
}

/// Collaborators and shared state for scan cycles
pub struct ScanContext {
    pub inventory: Arc<dyn InventorySource>,
    pub metrics: Arc<dyn MetricsSource>,
    pub persistence: Arc<dyn PersistenceStore>,
    pub history: Arc<dyn MetricsHistoryStore>,
    pub evaluator: PolicyEvaluator,
    pub estimator: CostEstimator,
    pub config: ScanConfig,
    pub scanner_metrics: ScannerMetrics,
    pub logger: StructuredLogger,
    pub health: HealthRegistry,
}

impl ScanContext {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        metrics: Arc<dyn MetricsSource>,
        persistence: Arc<dyn PersistenceStore>,
        history: Arc<dyn MetricsHistoryStore>,
        evaluator: PolicyEvaluator,
        estimator: CostEstimator,
    ) -> Self {
        Self {
            inventory,
            metrics,
            persistence,
            history,
            evaluator,
            estimator,
            config: ScanConfig::default(),
            scanner_metrics: ScannerMetrics::new(),
            logger: StructuredLogger::new("fleet-scanner"),
            health: HealthRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }
}

/// Success and failure counts for one collaborator within a cycle
#[derive(Debug, Default)]
struct Outcomes {
    ok: AtomicUsize,
    failed: AtomicUsize,
}

impl Outcomes {
    fn record(&self, ok: bool) {
        let counter = if ok { &self.ok } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.ok.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

#[derive(Debug, Default)]
struct CallTally {
    inventory: Outcomes,
    metrics: Outcomes,
    persistence: Outcomes,
}

/// A resource with the samples appended for it this cycle
struct Ingested {
    descriptor: ResourceDescriptor,
    samples: Vec<MetricSample>,
}

struct RegionScan {
    region: String,
    result: Result<RegionHarvest, String>,
}

#[derive(Default)]
struct RegionHarvest {
    resources: Vec<Ingested>,
    failures: Vec<ResourceFailure>,
}

pub struct ScanOrchestrator {
    ctx: Arc<ScanContext>,
    cycles: AtomicU64,
    phase: watch::Sender<ScanPhase>,
}

impl ScanOrchestrator {
    pub fn new(ctx: ScanContext) -> Self {
        let (phase, _) = watch::channel(ScanPhase::Idle);
        Self {
            ctx: Arc::new(ctx),
            cycles: AtomicU64::new(0),
            phase,
        }
    }

    pub fn context(&self) -> &Arc<ScanContext> {
        &self.ctx
    }

    /// Phase of the cycle in progress, or of the last one
    pub fn phase(&self) -> ScanPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ScanPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, report: &mut ScanReport, phase: ScanPhase) {
        debug!(cycle_id = report.cycle_id, phase = %phase, "Entering scan phase");
        report.phase = phase;
        self.phase.send_replace(phase);
    }

    /// Run one full scan cycle. Cancelling `cancel` stops in-flight work and
    /// returns the partial report with phase `Cancelled`.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> ScanReport {
        let cycle_id = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let clock = Instant::now();
        let tally = Arc::new(CallTally::default());
        let mut report = ScanReport::begin(cycle_id);
        self.enter(&mut report, ScanPhase::EnumeratingRegions);

        let regions = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.finish(report, &tally, clock, true).await,
            regions = self.resolve_regions(&tally) => regions,
        };

        // Scanning: inventory per region, then metric ingestion per resource
        self.enter(&mut report, ScanPhase::Scanning);
        let resource_permits = Arc::new(Semaphore::new(
            self.ctx.config.resource_concurrency.max(1),
        ));
        let region_permits = Arc::new(Semaphore::new(self.ctx.config.region_concurrency.max(1)));

        let mut region_tasks = TrackedTasks::new();
        for region in regions {
            let ctx = Arc::clone(&self.ctx);
            let region_permits = Arc::clone(&region_permits);
            let resource_permits = Arc::clone(&resource_permits);
            let tally = Arc::clone(&tally);
            region_tasks.spawn(region.clone(), async move {
                let _permit = region_permits.acquire_owned().await;
                scan_region(ctx, region, resource_permits, tally).await
            });
        }
        let region_scans = join_until_cancelled(region_tasks, cancel, Duration::ZERO).await;
        let cancelled = region_scans.cancelled;

        self.enter(&mut report, ScanPhase::Merging);
        let lost_regions = region_scans.lost.into_iter().map(|lost| RegionScan {
            region: lost.key,
            result: Err(lost.reason),
        });
        let mut ingested = Vec::new();
        for scan in region_scans.done.into_iter().chain(lost_regions) {
            match scan.result {
                Ok(harvest) => {
                    report.regions_scanned.push(scan.region);
                    report.excluded_resources.extend(harvest.failures);
                    ingested.extend(harvest.resources);
                }
                Err(reason) => {
                    self.ctx.logger.log_region_excluded(&scan.region, &reason);
                    report.excluded_regions.push(RegionFailure {
                        region: scan.region,
                        reason,
                    });
                }
            }
        }
        if cancelled {
            return self.finish(report, &tally, clock, true).await;
        }

        // Evaluating: one clock reading for the whole cycle
        self.enter(&mut report, ScanPhase::Evaluating);
        let now = Utc::now();
        let mut eval_tasks = TrackedTasks::new();
        for item in ingested {
            let ctx = Arc::clone(&self.ctx);
            let permits = Arc::clone(&resource_permits);
            let key = (
                item.descriptor.resource_id.clone(),
                item.descriptor.region.clone(),
            );
            eval_tasks.spawn(key, async move {
                let _permit = permits.acquire_owned().await;
                evaluate_resource(&ctx, item, now).await
            });
        }
        let evaluated = join_until_cancelled(eval_tasks, cancel, Duration::ZERO).await;
        report.outcomes = evaluated.done;
        for lost in evaluated.lost {
            let (resource_id, region) = lost.key;
            warn!(
                resource_id = %resource_id,
                region = %region,
                reason = %lost.reason,
                "Evaluation task failed"
            );
            report.excluded_resources.push(ResourceFailure {
                resource_id,
                region,
                reason: lost.reason,
            });
        }
        if evaluated.cancelled {
            return self.finish(report, &tally, clock, true).await;
        }

        self.enter(&mut report, ScanPhase::Persisting);
        let mut persist_tasks = TrackedTasks::new();
        for outcome in &report.outcomes {
            let ctx = Arc::clone(&self.ctx);
            let permits = Arc::clone(&resource_permits);
            let tally = Arc::clone(&tally);
            let cancel = cancel.clone();
            let descriptor = outcome.descriptor.clone();
            let projection = outcome.projection.clone();
            let samples = outcome.samples.clone();
            persist_tasks.spawn(descriptor.resource_id.clone(), async move {
                let _permit = permits.acquire_owned().await;
                // Writes not yet started are skipped once the cycle is cancelled
                if cancel.is_cancelled() {
                    return None;
                }
                let result = persist_outcome(&ctx, now, &descriptor, &projection, &samples).await;
                tally.persistence.record(result.is_ok());
                Some(result)
            });
        }
        let persisted =
            join_until_cancelled(persist_tasks, cancel, self.ctx.config.persist_grace).await;
        let cancelled = persisted.cancelled;
        for lost in persisted.lost {
            report.persistence_failures += 1;
            tally.persistence.record(false);
            self.ctx.scanner_metrics.inc_persistence_failures();
            warn!(resource_id = %lost.key, reason = %lost.reason, "Persistence task failed");
        }
        for result in persisted.done.into_iter().flatten() {
            if let Err(e) = result {
                report.persistence_failures += 1;
                self.ctx.scanner_metrics.inc_persistence_failures();
                if let FleetError::PersistenceFailure {
                    resource_id,
                    attempts,
                    message,
                } = &e
                {
                    self.ctx
                        .logger
                        .log_persistence_failed(resource_id, *attempts, message);
                } else {
                    warn!(error = %e, "Persistence failed");
                }
            }
        }

        self.finish(report, &tally, clock, cancelled).await
    }

    /// Configured regions, else discovered ones, else the default region
    async fn resolve_regions(&self, tally: &CallTally) -> Vec<String> {
        let config = &self.ctx.config;
        let mut regions = if !config.regions.is_empty() {
            config.regions.clone()
        } else {
            let start = Instant::now();
            let result = bounded(
                Collaborator::Inventory,
                "regions",
                config.call_timeout,
                self.ctx.inventory.list_regions(),
            )
            .await;
            self.ctx
                .scanner_metrics
                .observe_collaborator_latency(Collaborator::Inventory, start.elapsed().as_secs_f64());
            tally.inventory.record(result.is_ok());

            match result {
                Ok(regions) if !regions.is_empty() => regions,
                Ok(_) => {
                    warn!(
                        fallback = %config.default_region,
                        "Inventory returned no regions, using default region"
                    );
                    vec![config.default_region.clone()]
                }
                Err(e) => {
                    self.ctx
                        .scanner_metrics
                        .inc_collaborator_errors(Collaborator::Inventory);
                    warn!(
                        error = %e,
                        fallback = %config.default_region,
                        "Region discovery failed, using default region"
                    );
                    vec![config.default_region.clone()]
                }
            }
        };

        let mut seen = HashSet::new();
        regions.retain(|r| seen.insert(r.clone()));
        regions
    }

    async fn finish(
        &self,
        mut report: ScanReport,
        tally: &CallTally,
        clock: Instant,
        cancelled: bool,
    ) -> ScanReport {
        report.finished_at = Utc::now();
        let phase = if cancelled {
            ScanPhase::Cancelled
        } else {
            ScanPhase::Done
        };
        self.enter(&mut report, phase);

        let health = &self.ctx.health;
        let (ok, failed) = tally.inventory.counts();
        health.record_outcomes(components::INVENTORY, ok, failed).await;
        let (ok, failed) = tally.metrics.counts();
        health.record_outcomes(components::METRICS, ok, failed).await;
        let (ok, failed) = tally.persistence.counts();
        health.record_outcomes(components::PERSISTENCE, ok, failed).await;
        let unpriced = report
            .outcomes
            .iter()
            .filter(|o| o.projection.rate_source == RateSource::Unavailable)
            .count();
        health
            .record_outcomes(
                components::PRICING,
                report.outcomes.len() - unpriced,
                unpriced,
            )
            .await;

        let elapsed = clock.elapsed().as_secs_f64();
        if cancelled {
            info!(
                cycle_id = report.cycle_id,
                resources = report.outcomes.len(),
                "Scan cycle cancelled"
            );
            return report;
        }

        health.set_ready(true).await;

        let metrics = &self.ctx.scanner_metrics;
        let projections: Vec<CostProjection> = report.projections();
        metrics.observe_cycle_duration(elapsed);
        metrics.set_cycle_counts(
            report.regions_scanned.len(),
            report.excluded_region_count(),
            report.outcomes.len(),
            report.excluded_resource_count(),
            report.underutilized().count(),
        );
        metrics.set_fleet_monthly_forecast(total_monthly(&projections).to_f64().unwrap_or(0.0));

        self.ctx.logger.log_cycle_complete(
            report.cycle_id,
            report.outcomes.len(),
            report.excluded_region_count(),
            report.excluded_resource_count(),
            report.persistence_failures,
            elapsed,
        );
        report
    }
}

/// A task that ended without a value, with the key it was spawned under
struct LostTask<K> {
    key: K,
    reason: String,
}

/// A `JoinSet` that remembers what each task was scanning, so a task that
/// panics is still reported against its resource or region
struct TrackedTasks<K, T> {
    tasks: JoinSet<T>,
    keys: HashMap<task::Id, K>,
}

impl<K, T: Send + 'static> TrackedTasks<K, T> {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            keys: HashMap::new(),
        }
    }

    fn spawn<F>(&mut self, key: K, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.keys.insert(handle.id(), key);
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn abort_all(&mut self) {
        self.tasks.abort_all();
    }

    /// Next finished task. Aborted tasks are skipped.
    async fn join_next(&mut self) -> Option<Result<T, LostTask<K>>> {
        loop {
            match self.tasks.join_next_with_id().await? {
                Ok((id, value)) => {
                    self.keys.remove(&id);
                    return Some(Ok(value));
                }
                Err(e) => {
                    let key = self.keys.remove(&e.id());
                    match key {
                        Some(key) if !e.is_cancelled() => {
                            return Some(Err(LostTask {
                                key,
                                reason: e.to_string(),
                            }))
                        }
                        Some(_) => {}
                        None => warn!(error = %e, "Untracked scan task failed"),
                    }
                }
            }
        }
    }
}

/// Results of one phase's tasks
struct Joined<K, T> {
    done: Vec<T>,
    lost: Vec<LostTask<K>>,
    cancelled: bool,
}

impl<K, T> Joined<K, T> {
    fn take(&mut self, next: Result<T, LostTask<K>>) {
        match next {
            Ok(value) => self.done.push(value),
            Err(lost) => self.lost.push(lost),
        }
    }
}

/// Collect task results until the set drains or `cancel` fires. On
/// cancellation, running tasks get `grace` to finish before the rest are
/// aborted.
async fn join_until_cancelled<K, T: Send + 'static>(
    mut tasks: TrackedTasks<K, T>,
    cancel: &CancellationToken,
    grace: Duration,
) -> Joined<K, T> {
    let mut joined = Joined {
        done: Vec::with_capacity(tasks.len()),
        lost: Vec::new(),
        cancelled: false,
    };
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = tasks.join_next() => match next {
                Some(next) => joined.take(next),
                None => return joined,
            },
        }
    }

    joined.cancelled = true;
    if !grace.is_zero() && !tasks.is_empty() {
        let drain = async {
            while let Some(next) = tasks.join_next().await {
                joined.take(next);
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(
                remaining = tasks.len(),
                grace_secs = grace.as_secs_f64(),
                "Grace period elapsed, aborting remaining tasks"
            );
        }
    }
    tasks.abort_all();
    joined
}

async fn scan_region(
    ctx: Arc<ScanContext>,
    region: String,
    permits: Arc<Semaphore>,
    tally: Arc<CallTally>,
) -> RegionScan {
    let start = Instant::now();
    let listed = bounded(
        Collaborator::Inventory,
        &region,
        ctx.config.call_timeout,
        ctx.inventory.list_resources(&region),
    )
    .await;
    ctx.scanner_metrics
        .observe_collaborator_latency(Collaborator::Inventory, start.elapsed().as_secs_f64());
    tally.inventory.record(listed.is_ok());

    let descriptors = match listed {
        Ok(descriptors) => descriptors,
        Err(e) => {
            ctx.scanner_metrics
                .inc_collaborator_errors(Collaborator::Inventory);
            return RegionScan {
                region,
                result: Err(e.to_string()),
            };
        }
    };

    debug!(region = %region, resources = descriptors.len(), "Listed resources");

    let mut tasks = TrackedTasks::new();
    for descriptor in descriptors {
        let ctx = Arc::clone(&ctx);
        let permits = Arc::clone(&permits);
        let tally = Arc::clone(&tally);
        tasks.spawn(descriptor.resource_id.clone(), async move {
            let _permit = permits.acquire_owned().await;
            ingest_resource(&ctx, descriptor, &tally).await
        });
    }

    let mut harvest = RegionHarvest::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(item)) => harvest.resources.push(item),
            Ok(Err(failure)) => harvest.failures.push(failure),
            Err(lost) => {
                warn!(
                    region = %region,
                    resource_id = %lost.key,
                    reason = %lost.reason,
                    "Resource task failed"
                );
                harvest.failures.push(ResourceFailure {
                    resource_id: lost.key,
                    region: region.clone(),
                    reason: lost.reason,
                });
            }
        }
    }

    RegionScan {
        region,
        result: Ok(harvest),
    }
}

/// Fetch recent samples for a resource and append them to history.
///
/// A resource with no CPU history yet is backfilled with the full lookback;
/// otherwise only the newest sample of each kind is appended.
async fn ingest_resource(
    ctx: &ScanContext,
    descriptor: ResourceDescriptor,
    tally: &CallTally,
) -> Result<Ingested, ResourceFailure> {
    if descriptor.state.is_inactive() {
        return Ok(Ingested {
            descriptor,
            samples: Vec::new(),
        });
    }

    let resource_id = descriptor.resource_id.clone();
    let failure = |reason: String| ResourceFailure {
        resource_id: resource_id.clone(),
        region: descriptor.region.clone(),
        reason,
    };

    let first_seen = ctx
        .history
        .series_len(&resource_id, MetricKind::CpuUtilization)
        == 0;
    let lookback_days = if first_seen {
        ctx.evaluator.config().history_days.max(1)
    } else {
        1
    };

    let mut appended = Vec::new();
    for kind in MetricKind::ALL {
        let start = Instant::now();
        let fetched = bounded(
            Collaborator::Metrics,
            &resource_id,
            ctx.config.call_timeout,
            ctx.metrics.fetch_recent(&resource_id, kind, lookback_days),
        )
        .await;
        ctx.scanner_metrics
            .observe_collaborator_latency(Collaborator::Metrics, start.elapsed().as_secs_f64());
        tally.metrics.record(fetched.is_ok());

        let samples = match fetched {
            Ok(samples) => samples,
            Err(e) => {
                ctx.scanner_metrics
                    .inc_collaborator_errors(Collaborator::Metrics);
                if kind == MetricKind::CpuUtilization {
                    return Err(failure(e.to_string()));
                }
                warn!(
                    resource_id = %resource_id,
                    kind = %kind,
                    error = %e,
                    "Metric fetch failed, treating as absent"
                );
                continue;
            }
        };

        let selected: Vec<MetricSample> = if first_seen {
            samples
        } else {
            samples.into_iter().max_by_key(|s| s.timestamp).into_iter().collect()
        };

        for sample in selected {
            ctx.history
                .append(sample.clone())
                .map_err(|e| failure(e.to_string()))?;
            appended.push(sample);
        }
    }

    Ok(Ingested {
        descriptor,
        samples: appended,
    })
}

async fn evaluate_resource(ctx: &ScanContext, item: Ingested, now: DateTime<Utc>) -> ResourceOutcome {
    let verdict = ctx
        .evaluator
        .evaluate(&item.descriptor, ctx.history.as_ref(), now);
    let projection = ctx.estimator.estimate(&item.descriptor, &verdict).await;

    if let Some(result) = verdict.result() {
        if result.underutilized {
            ctx.logger.log_underutilized(result, Some(&projection));
        }
        if result.spike_detected {
            ctx.scanner_metrics.inc_spikes_detected();
            ctx.logger.log_cpu_spike(result);
        }
    }

    ResourceOutcome {
        descriptor: item.descriptor,
        verdict,
        projection,
        samples: item.samples,
    }
}

/// Append the snapshot and cost record for one resource, each with retries.
/// Both records are built in full before the first write.
async fn persist_outcome(
    ctx: &ScanContext,
    timestamp: DateTime<Utc>,
    descriptor: &ResourceDescriptor,
    projection: &CostProjection,
    samples: &[MetricSample],
) -> Result<(), FleetError> {
    let snapshot = ResourceSnapshot {
        timestamp,
        descriptor: descriptor.clone(),
        samples: samples.to_vec(),
    };
    let record = ResourceCostRecord::assemble(timestamp, descriptor, projection, samples);

    let policy = &ctx.config.persistence_retry;
    let timeout = ctx.config.call_timeout;
    let store = &ctx.persistence;
    let scope = descriptor.resource_id.as_str();
    let snapshot = &snapshot;
    let record = &record;

    let exhausted = |e: super::retry::RetriesExhausted<FleetError>| FleetError::PersistenceFailure {
        resource_id: descriptor.resource_id.clone(),
        attempts: e.attempts,
        message: e.last_error.to_string(),
    };

    retry_with_backoff(policy, "append_resource_snapshot", move || {
        bounded(
            Collaborator::Persistence,
            scope,
            timeout,
            store.append_resource_snapshot(snapshot),
        )
    })
    .await
    .map_err(exhausted)?;

    retry_with_backoff(policy, "append_cost_record", move || {
        bounded(
            Collaborator::Persistence,
            scope,
            timeout,
            store.append_cost_record(record),
        )
    })
    .await
    .map_err(exhausted)?;

    Ok(())
}
