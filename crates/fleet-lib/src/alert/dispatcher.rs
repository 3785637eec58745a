//! Alert delivery with deduplication
//!
//! An alert for the same (kind, region, resource) is suppressed while a previous
//! one is still inside the dedup window. Delivery failures are logged and
//! not recorded, so the alert is tried again next cycle.

use super::formatter::{Alert, AlertFormatter, AlertKind};
use crate::error::{bounded, Collaborator};
use crate::scan::{AlertTransport, ScanReport};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default deduplication window (6 hours)
const DEFAULT_DEDUP_WINDOW_SECS: u64 = 6 * 60 * 60;

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    kind: AlertKind,
    region: String,
    resource_id: String,
}

/// Counts from one dispatch round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub suppressed: usize,
    pub failed: usize,
}

pub struct AlertDispatcher {
    transport: Arc<dyn AlertTransport>,
    formatter: AlertFormatter,
    dedup_window: Duration,
    send_timeout: Duration,
    recent_alerts: RwLock<HashMap<DedupKey, Instant>>,
}

impl AlertDispatcher {
    pub fn new(transport: Arc<dyn AlertTransport>) -> Self {
        Self {
            transport,
            formatter: AlertFormatter::new(),
            dedup_window: Duration::from_secs(DEFAULT_DEDUP_WINDOW_SECS),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            recent_alerts: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn formatter(&self) -> &AlertFormatter {
        &self.formatter
    }

    fn key(alert: &Alert) -> DedupKey {
        DedupKey {
            kind: alert.kind,
            region: alert.region.clone(),
            resource_id: alert.resource_id.clone(),
        }
    }

    pub fn should_suppress(&self, alert: &Alert) -> bool {
        let alerts = self.recent_alerts.read().unwrap_or_else(|e| e.into_inner());
        alerts
            .get(&Self::key(alert))
            .map(|last| last.elapsed() < self.dedup_window)
            .unwrap_or(false)
    }

    fn record(&self, alert: &Alert) {
        let mut alerts = self.recent_alerts.write().unwrap_or_else(|e| e.into_inner());
        alerts.insert(Self::key(alert), Instant::now());
    }

    /// Drop entries older than the dedup window
    pub fn cleanup_expired(&self) {
        let mut alerts = self.recent_alerts.write().unwrap_or_else(|e| e.into_inner());
        alerts.retain(|_, time| time.elapsed() < self.dedup_window);
    }

    /// Send one alert unless it is a recent duplicate
    pub async fn send(&self, alert: &Alert) -> Option<bool> {
        if self.should_suppress(alert) {
            debug!(
                kind = %alert.kind,
                resource_id = %alert.resource_id,
                "Suppressing duplicate alert"
            );
            return None;
        }

        let result = bounded(
            Collaborator::Alerts,
            &alert.resource_id,
            self.send_timeout,
            self.transport.send_alert(&alert.text),
        )
        .await;

        match result {
            Ok(()) => {
                self.record(alert);
                Some(true)
            }
            Err(e) => {
                warn!(
                    kind = %alert.kind,
                    resource_id = %alert.resource_id,
                    error = %e,
                    "Alert delivery failed"
                );
                Some(false)
            }
        }
    }

    /// Send every alert a completed cycle produced
    pub async fn dispatch(&self, report: &ScanReport) -> DispatchSummary {
        self.cleanup_expired();

        let mut summary = DispatchSummary::default();
        for alert in self.formatter.alerts_for(report) {
            match self.send(&alert).await {
                None => summary.suppressed += 1,
                Some(true) => summary.sent += 1,
                Some(false) => summary.failed += 1,
            }
        }
        summary
    }
}
