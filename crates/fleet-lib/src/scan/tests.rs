//! Scan pipeline tests
//!
//! These drive full cycles against mock collaborators to check region
//! exclusion, timeouts, cancellation, backfill and persistence retries
//! without any cloud access.

#[cfg(test)]
mod pipeline_tests {
    use crate::cost::{CostEstimator, RateCache, StaticPricingSource, StaticRate};
    use crate::health::{components, ComponentStatus, HealthRegistry};
    use crate::history::{InMemoryHistoryStore, MetricsHistoryStore};
    use crate::models::{
        CostImpactRank, LifecycleState, MetricKind, MetricSample, ResourceCostRecord,
        ResourceDescriptor, ResourceSnapshot,
    };
    use crate::policy::{NoVerdictReason, PolicyEvaluator, Verdict};
    use crate::scan::{
        InventorySource, MetricsSource, PersistenceStore, RetryPolicy, ScanConfig, ScanContext,
        ScanLoopBuilder, ScanOrchestrator, ScanPhase,
    };
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use rust_decimal::Decimal;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio_util::sync::CancellationToken;

    fn descriptor(id: &str, region: &str, resource_type: &str, state: LifecycleState) -> ResourceDescriptor {
        ResourceDescriptor {
            resource_id: id.to_string(),
            region: region.to_string(),
            resource_type: resource_type.to_string(),
            state,
            launched_at: Utc::now() - ChronoDuration::days(60),
            tags: HashMap::new(),
        }
    }

    #[derive(Default)]
    struct MockInventory {
        regions: HashMap<String, Vec<ResourceDescriptor>>,
        failing: HashSet<String>,
        hanging: HashSet<String>,
        panicking: HashSet<String>,
        discovery_fails: bool,
    }

    impl MockInventory {
        fn region(mut self, region: &str, resources: Vec<ResourceDescriptor>) -> Self {
            self.regions.insert(region.to_string(), resources);
            self
        }

        fn failing(mut self, region: &str) -> Self {
            self.regions.entry(region.to_string()).or_default();
            self.failing.insert(region.to_string());
            self
        }

        fn hanging(mut self, region: &str) -> Self {
            self.regions.entry(region.to_string()).or_default();
            self.hanging.insert(region.to_string());
            self
        }
    }

    #[async_trait]
    impl InventorySource for MockInventory {
        async fn list_regions(&self) -> anyhow::Result<Vec<String>> {
            if self.discovery_fails {
                anyhow::bail!("UnauthorizedOperation");
            }
            let mut regions: Vec<String> = self.regions.keys().cloned().collect();
            regions.sort();
            Ok(regions)
        }

        async fn list_resources(&self, region: &str) -> anyhow::Result<Vec<ResourceDescriptor>> {
            if self.failing.contains(region) {
                anyhow::bail!("AccessDenied in {}", region);
            }
            if self.hanging.contains(region) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.panicking.contains(region) {
                panic!("inventory client bug in {}", region);
            }
            Ok(self.regions.get(region).cloned().unwrap_or_default())
        }
    }

    /// Serves one CPU reading per day (the last one is "now") and a single
    /// current network reading per kind
    #[derive(Default)]
    struct MockMetrics {
        cpu: HashMap<String, Vec<f64>>,
        failing_cpu: HashSet<String>,
        panicking: HashSet<String>,
        failing_network: bool,
        calls: Mutex<Vec<(String, MetricKind, u32)>>,
    }

    impl MockMetrics {
        fn cpu(mut self, resource_id: &str, values: &[f64]) -> Self {
            self.cpu.insert(resource_id.to_string(), values.to_vec());
            self
        }

        fn calls_for(&self, resource_id: &str) -> Vec<(MetricKind, u32)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _, _)| id == resource_id)
                .map(|(_, kind, days)| (*kind, *days))
                .collect()
        }
    }

    #[async_trait]
    impl MetricsSource for MockMetrics {
        async fn fetch_recent(
            &self,
            resource_id: &str,
            kind: MetricKind,
            lookback_days: u32,
        ) -> anyhow::Result<Vec<MetricSample>> {
            self.calls
                .lock()
                .unwrap()
                .push((resource_id.to_string(), kind, lookback_days));
            let now = Utc::now();
            if self.panicking.contains(resource_id) {
                panic!("metrics client bug for {}", resource_id);
            }

            if kind != MetricKind::CpuUtilization {
                if self.failing_network {
                    anyhow::bail!("Throttling");
                }
                return Ok(vec![MetricSample::new(resource_id, kind, now, Some(1_000.0))]);
            }

            if self.failing_cpu.contains(resource_id) {
                anyhow::bail!("InvalidParameterValue");
            }
            let values = self.cpu.get(resource_id).cloned().unwrap_or_default();
            let n = values.len() as i64;
            Ok(values
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    let days_ago = n - 1 - i as i64;
                    (days_ago < i64::from(lookback_days)).then(|| {
                        MetricSample::new(
                            resource_id,
                            kind,
                            now - ChronoDuration::days(days_ago),
                            Some(v),
                        )
                    })
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct MockPersistence {
        failures_left: AtomicUsize,
        always_fail: bool,
        write_delay: Duration,
        snapshots: Mutex<Vec<ResourceSnapshot>>,
        records: Mutex<Vec<ResourceCostRecord>>,
    }

    impl MockPersistence {
        fn check(&self) -> anyhow::Result<()> {
            if self.always_fail {
                anyhow::bail!("connection refused");
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                anyhow::bail!("deadlock detected");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceStore for MockPersistence {
        async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> anyhow::Result<()> {
            tokio::time::sleep(self.write_delay).await;
            self.check()?;
            self.snapshots.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn append_cost_record(&self, record: &ResourceCostRecord) -> anyhow::Result<()> {
            tokio::time::sleep(self.write_delay).await;
            self.check()?;
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn pricing() -> StaticPricingSource {
        StaticPricingSource::new(vec![
            StaticRate {
                resource_type: "t3.micro".to_string(),
                region: None,
                spot: None,
                on_demand: Some(Decimal::new(104, 4)),
            },
            StaticRate {
                resource_type: "m5.large".to_string(),
                region: None,
                spot: None,
                on_demand: Some(Decimal::new(96, 3)),
            },
        ])
    }

    fn fast_config() -> ScanConfig {
        ScanConfig {
            call_timeout: Duration::from_millis(200),
            persistence_retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
            },
            ..ScanConfig::default()
        }
    }

    struct Harness {
        orchestrator: ScanOrchestrator,
        history: Arc<InMemoryHistoryStore>,
        metrics: Arc<MockMetrics>,
        persistence: Arc<MockPersistence>,
        health: HealthRegistry,
    }

    fn harness(
        inventory: MockInventory,
        metrics: MockMetrics,
        persistence: MockPersistence,
        config: ScanConfig,
    ) -> Harness {
        let history = Arc::new(InMemoryHistoryStore::new());
        let metrics = Arc::new(metrics);
        let persistence = Arc::new(persistence);
        let health = HealthRegistry::new();
        let estimator = CostEstimator::new(
            Arc::new(pricing()),
            Arc::new(RateCache::new()),
            Duration::from_millis(200),
        );

        let ctx = ScanContext::new(
            Arc::new(inventory),
            metrics.clone(),
            persistence.clone(),
            history.clone(),
            PolicyEvaluator::default(),
            estimator,
        )
        .with_config(config)
        .with_health(health.clone());

        Harness {
            orchestrator: ScanOrchestrator::new(ctx),
            history,
            metrics,
            persistence,
            health,
        }
    }

    #[tokio::test]
    async fn test_failing_region_is_excluded_others_present() {
        let inventory = MockInventory::default()
            .region(
                "us-east-1",
                vec![
                    descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running),
                    descriptor("i-b", "us-east-1", "m5.large", LifecycleState::Running),
                ],
            )
            .failing("eu-west-1")
            .region(
                "ap-south-1",
                vec![descriptor("i-c", "ap-south-1", "t3.micro", LifecycleState::Running)],
            );
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.phase, ScanPhase::Done);
        assert_eq!(report.excluded_region_count(), 1);
        assert_eq!(report.excluded_regions[0].region, "eu-west-1");
        assert!(report.excluded_regions[0].reason.contains("AccessDenied"));

        let mut ids: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.descriptor.resource_id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["i-a", "i-b", "i-c"]);
        assert_eq!(report.regions_scanned.len(), 2);

        let health = h.health.health().await;
        assert_eq!(
            health.components[components::INVENTORY].status,
            ComponentStatus::Degraded
        );
        assert!(h.health.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_region_timeout_counts_as_failure() {
        let inventory = MockInventory::default()
            .region(
                "us-east-1",
                vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
            )
            .hanging("us-west-2");
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.excluded_region_count(), 1);
        assert_eq!(report.excluded_regions[0].region, "us-west-2");
        assert!(report.excluded_regions[0].reason.contains("timed out"));
        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_falls_back_to_default_region() {
        let mut inventory = MockInventory::default()
            .region(
                "us-east-1",
                vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
            )
            .region(
                "eu-west-1",
                vec![descriptor("i-b", "eu-west-1", "t3.micro", LifecycleState::Running)],
            );
        inventory.discovery_fails = true;
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.regions_scanned, vec!["us-east-1".to_string()]);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.excluded_region_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_regions_skip_discovery() {
        let inventory = MockInventory::default()
            .region(
                "us-east-1",
                vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
            )
            .failing("eu-west-1");
        let config = ScanConfig {
            regions: vec!["us-east-1".to_string(), "us-east-1".to_string()],
            ..fast_config()
        };
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), config);

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;
        assert_eq!(report.regions_scanned, vec!["us-east-1".to_string()]);
        assert_eq!(report.excluded_region_count(), 0);
    }

    #[tokio::test]
    async fn test_first_seen_backfill_then_latest_only() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-idle", "us-east-1", "m5.large", LifecycleState::Running)],
        );
        let metrics = MockMetrics::default().cpu("i-idle", &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let h = harness(inventory, metrics, MockPersistence::default(), fast_config());

        let first = h.orchestrator.run_cycle(&CancellationToken::new()).await;
        assert_eq!(
            h.history.series_len("i-idle", MetricKind::CpuUtilization),
            7
        );
        assert_eq!(h.history.series_len("i-idle", MetricKind::NetworkIn), 1);

        let outcome = &first.outcomes[0];
        let result = outcome.verdict.result().expect("verdict expected");
        assert!(result.underutilized);
        assert_eq!(result.avg_cpu, 6.0);
        assert_eq!(outcome.projection.monthly_forecast, Decimal::new(3504, 2));
        assert_eq!(outcome.projection.rank, CostImpactRank::Medium);
        assert_eq!(outcome.samples.len(), 9);

        h.orchestrator.run_cycle(&CancellationToken::new()).await;
        assert_eq!(
            h.history.series_len("i-idle", MetricKind::CpuUtilization),
            8
        );

        let cpu_lookbacks: Vec<u32> = h
            .metrics
            .calls_for("i-idle")
            .into_iter()
            .filter(|(kind, _)| *kind == MetricKind::CpuUtilization)
            .map(|(_, days)| days)
            .collect();
        assert_eq!(cpu_lookbacks, vec![7, 1]);
    }

    #[tokio::test]
    async fn test_cpu_failure_excludes_resource_network_failure_does_not() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![
                descriptor("i-ok", "us-east-1", "t3.micro", LifecycleState::Running),
                descriptor("i-bad", "us-east-1", "t3.micro", LifecycleState::Running),
            ],
        );
        let mut metrics = MockMetrics::default()
            .cpu("i-ok", &[50.0, 50.0, 50.0])
            .cpu("i-bad", &[50.0, 50.0, 50.0]);
        metrics.failing_cpu.insert("i-bad".to_string());
        metrics.failing_network = true;
        let h = harness(inventory, metrics, MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.excluded_resource_count(), 1);
        assert_eq!(report.excluded_resources[0].resource_id, "i-bad");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].verdict.underutilized(), Some(false));
        assert_eq!(h.history.series_len("i-ok", MetricKind::NetworkIn), 0);

        let health = h.health.health().await;
        assert_eq!(
            health.components[components::METRICS].status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_panicking_metrics_client_excludes_resource() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![
                descriptor("i-ok", "us-east-1", "t3.micro", LifecycleState::Running),
                descriptor("i-bad", "us-east-1", "t3.micro", LifecycleState::Running),
            ],
        );
        let mut metrics = MockMetrics::default()
            .cpu("i-ok", &[50.0, 50.0, 50.0])
            .cpu("i-bad", &[50.0, 50.0, 50.0]);
        metrics.panicking.insert("i-bad".to_string());
        let h = harness(inventory, metrics, MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.phase, ScanPhase::Done);
        assert_eq!(report.outcomes.len() + report.excluded_resource_count(), 2);
        assert_eq!(report.outcomes[0].descriptor.resource_id, "i-ok");
        assert_eq!(report.excluded_resources[0].resource_id, "i-bad");
        assert_eq!(report.excluded_resources[0].region, "us-east-1");
        assert!(report.excluded_resources[0].reason.contains("panicked"));
    }

    #[tokio::test]
    async fn test_panicking_region_task_excludes_region() {
        let mut inventory = MockInventory::default()
            .region(
                "us-east-1",
                vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
            )
            .region("eu-west-1", Vec::new());
        inventory.panicking.insert("eu-west-1".to_string());
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.regions_scanned, vec!["us-east-1".to_string()]);
        assert_eq!(report.excluded_region_count(), 1);
        assert_eq!(report.excluded_regions[0].region, "eu-west-1");
        assert!(report.excluded_regions[0].reason.contains("panicked"));
    }

    #[tokio::test]
    async fn test_inactive_resource_has_no_verdict_and_no_fetch() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-off", "us-east-1", "m5.large", LifecycleState::Stopped)],
        );
        let metrics = MockMetrics::default().cpu("i-off", &[1.0, 1.0, 1.0]);
        let h = harness(inventory, metrics, MockPersistence::default(), fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(
            report.outcomes[0].verdict,
            Verdict::NoVerdict(NoVerdictReason::InactiveState {
                state: LifecycleState::Stopped
            })
        );
        assert_eq!(report.outcomes[0].projection.underutilized, None);
        assert!(h.metrics.calls_for("i-off").is_empty());
    }

    #[tokio::test]
    async fn test_persistence_retries_transient_failures() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
        );
        let persistence = MockPersistence {
            failures_left: AtomicUsize::new(2),
            ..MockPersistence::default()
        };
        let h = harness(inventory, MockMetrics::default(), persistence, fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.persistence_failures, 0);
        assert_eq!(h.persistence.snapshots.lock().unwrap().len(), 1);

        let records = h.persistence.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resource_id, "i-a");
        assert_eq!(records[0].hourly_rate, Decimal::new(104, 4));
    }

    #[tokio::test]
    async fn test_persistence_exhaustion_is_a_cycle_warning() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![
                descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running),
                descriptor("i-b", "us-east-1", "t3.micro", LifecycleState::Running),
            ],
        );
        let persistence = MockPersistence {
            always_fail: true,
            ..MockPersistence::default()
        };
        let h = harness(inventory, MockMetrics::default(), persistence, fast_config());

        let report = h.orchestrator.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.phase, ScanPhase::Done);
        assert_eq!(report.persistence_failures, 2);
        assert_eq!(report.outcomes.len(), 2);

        let health = h.health.health().await;
        assert_eq!(
            health.components[components::PERSISTENCE].status,
            ComponentStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_cancel_mid_cycle() {
        let inventory = MockInventory::default().hanging("us-east-1");
        let config = ScanConfig {
            call_timeout: Duration::from_secs(30),
            ..fast_config()
        };
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), config);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(Duration::from_secs(5), h.orchestrator.run_cycle(&cancel))
            .await
            .expect("cycle should stop promptly");

        assert!(report.is_cancelled());
        assert!(report.outcomes.is_empty());
        assert_eq!(h.orchestrator.phase(), ScanPhase::Cancelled);
        assert!(!h.health.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_cancel_while_persisting_lets_started_writes_finish() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![
                descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running),
                descriptor("i-b", "us-east-1", "t3.micro", LifecycleState::Running),
                descriptor("i-c", "us-east-1", "t3.micro", LifecycleState::Running),
            ],
        );
        let persistence = MockPersistence {
            write_delay: Duration::from_millis(50),
            ..MockPersistence::default()
        };
        // One writer at a time: the first resource is mid-write at cancel,
        // the other two have not started
        let config = ScanConfig {
            resource_concurrency: 1,
            ..fast_config()
        };
        let h = harness(inventory, MockMetrics::default(), persistence, config);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut phases = h.orchestrator.subscribe_phase();
        tokio::spawn(async move {
            let _ = phases.wait_for(|phase| *phase == ScanPhase::Persisting).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(Duration::from_secs(5), h.orchestrator.run_cycle(&cancel))
            .await
            .expect("cycle should stop promptly");

        assert!(report.is_cancelled());
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.persistence_failures, 0);
        assert_eq!(h.persistence.snapshots.lock().unwrap().len(), 1);
        assert_eq!(h.persistence.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_cycle_does_nothing() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
        );
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = h.orchestrator.run_cycle(&cancel).await;

        assert!(report.is_cancelled());
        assert!(report.regions_scanned.is_empty());
        assert!(h.persistence.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_loop_runs_bounded_cycles() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
        );
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let (scan_loop, mut reports) = ScanLoopBuilder::new()
            .orchestrator(Arc::new(h.orchestrator))
            .interval(Duration::from_millis(10))
            .jitter(Duration::ZERO)
            .max_cycles(2)
            .build()
            .unwrap();

        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        scan_loop.run(shutdown_rx).await;

        let first = reports.recv().await.unwrap();
        let second = reports.recv().await.unwrap();
        assert_eq!(first.cycle_id, 1);
        assert_eq!(second.cycle_id, 2);
        assert!(reports.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scan_loop_stops_on_shutdown() {
        let inventory = MockInventory::default().region(
            "us-east-1",
            vec![descriptor("i-a", "us-east-1", "t3.micro", LifecycleState::Running)],
        );
        let h = harness(inventory, MockMetrics::default(), MockPersistence::default(), fast_config());

        let (scan_loop, mut reports) = ScanLoopBuilder::new()
            .orchestrator(Arc::new(h.orchestrator))
            .interval(Duration::from_secs(3600))
            .build()
            .unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(scan_loop.run(shutdown_rx));

        let first = reports.recv().await.unwrap();
        assert_eq!(first.phase, ScanPhase::Done);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
    }
}
