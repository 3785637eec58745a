//! Policy evaluation over metrics history
//!
//! This module provides:
//! - Multi-day underutilization detection
//! - CPU spike detection (threshold crossing, or the absolute-jump variant)
//! - An explicit "no verdict" outcome for inactive resources and thin history
//!
//! Evaluation only ever reads a bounded recent window of a resource's
//! history, never its full lifetime.

mod spike;
mod underutilization;
mod window;

pub use spike::{
    SpikeAnomaly, SpikeAssessment, SpikeDetector, SpikeRule, DEFAULT_JUMP_LOOKBACK_HOURS,
    DEFAULT_JUMP_THRESHOLD,
};
pub use underutilization::{UnderutilizationAssessment, UnderutilizationPolicy};
pub use window::{calendar_window, SampleWindow};

use crate::history::MetricsHistoryStore;
use crate::models::{
    round2, AlertLevel, EvaluationResult, LifecycleState, MetricKind, MetricSample,
    ResourceDescriptor,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Recommendation attached to underutilized resources
pub const DOWNSIZE_RECOMMENDATION: &str = "downsize or convert to on-demand serverless";

/// Thresholds and windows for policy evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Calendar days of history considered (default: 7)
    pub history_days: u32,
    /// Minimum qualifying CPU samples before any verdict (default: 3)
    pub min_days_to_flag: usize,
    /// Mean CPU strictly below this is underutilized (default: 10.0)
    pub cpu_threshold_low: f64,
    /// Current CPU strictly above this can be a spike (default: 80.0)
    pub cpu_threshold_high: f64,
    /// Optional mean NETWORK_IN ceiling for underutilization (bytes)
    pub network_in_threshold: Option<f64>,
    pub spike_rule: SpikeRule,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            history_days: 7,
            min_days_to_flag: 3,
            cpu_threshold_low: 10.0,
            cpu_threshold_high: 80.0,
            network_in_threshold: None,
            spike_rule: SpikeRule::ThresholdCrossing,
        }
    }
}

/// Why an evaluation produced no verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoVerdictReason {
    /// Stopped and terminated resources are never evaluated
    InactiveState { state: LifecycleState },
    /// Too few qualifying CPU samples in the window
    InsufficientHistory {
        qualifying: usize,
        required: usize,
        dropped: usize,
    },
}

/// Outcome of evaluating one resource.
///
/// `NoVerdict` is not the same as an `Evaluated` result with both flags
/// false: the former means nothing is known, the latter that the resource
/// was checked and found fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    Evaluated(EvaluationResult),
    NoVerdict(NoVerdictReason),
}

impl Verdict {
    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            Verdict::Evaluated(result) => Some(result),
            Verdict::NoVerdict(_) => None,
        }
    }

    pub fn into_result(self) -> Option<EvaluationResult> {
        match self {
            Verdict::Evaluated(result) => Some(result),
            Verdict::NoVerdict(_) => None,
        }
    }

    /// `Some(flag)` when evaluated, `None` without a verdict
    pub fn underutilized(&self) -> Option<bool> {
        self.result().map(|r| r.underutilized)
    }

    pub fn spike_detected(&self) -> bool {
        self.result().map(|r| r.spike_detected).unwrap_or(false)
    }
}

/// Evaluates underutilization and spike policies for single resources
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    config: PolicyConfig,
}

impl PolicyEvaluator {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Window of history evaluated at `now`
    pub fn window_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        calendar_window(now, self.config.history_days)
    }

    /// Evaluate a resource against the windowed history held in `store`
    pub fn evaluate(
        &self,
        descriptor: &ResourceDescriptor,
        store: &dyn MetricsHistoryStore,
        now: DateTime<Utc>,
    ) -> Verdict {
        if descriptor.state.is_inactive() {
            return Verdict::NoVerdict(NoVerdictReason::InactiveState {
                state: descriptor.state,
            });
        }

        let (since, until) = self.window_bounds(now);
        let cpu = store.window(&descriptor.resource_id, MetricKind::CpuUtilization, since, until);
        let network_in = if self.config.network_in_threshold.is_some() {
            store.window(&descriptor.resource_id, MetricKind::NetworkIn, since, until)
        } else {
            Vec::new()
        };

        self.evaluate_samples(descriptor, &cpu, &network_in, now)
    }

    /// Evaluate a resource from raw samples.
    ///
    /// Samples outside the window are ignored, so callers may pass a longer
    /// history than needed.
    pub fn evaluate_samples(
        &self,
        descriptor: &ResourceDescriptor,
        cpu_samples: &[MetricSample],
        network_in_samples: &[MetricSample],
        now: DateTime<Utc>,
    ) -> Verdict {
        if descriptor.state.is_inactive() {
            return Verdict::NoVerdict(NoVerdictReason::InactiveState {
                state: descriptor.state,
            });
        }

        let (since, until) = self.window_bounds(now);
        let cpu = SampleWindow::select(cpu_samples, since, until);

        if cpu.len() < self.config.min_days_to_flag.max(1) {
            debug!(
                resource_id = %descriptor.resource_id,
                qualifying = cpu.len(),
                required = self.config.min_days_to_flag,
                dropped = cpu.dropped,
                "Insufficient history for verdict"
            );
            return Verdict::NoVerdict(NoVerdictReason::InsufficientHistory {
                qualifying: cpu.len(),
                required: self.config.min_days_to_flag,
                dropped: cpu.dropped,
            });
        }

        let network_in = self
            .config
            .network_in_threshold
            .map(|_| SampleWindow::select(network_in_samples, since, until));

        let underutilization = UnderutilizationPolicy {
            cpu_threshold_low: self.config.cpu_threshold_low,
            network_in_threshold: self.config.network_in_threshold,
        }
        .assess(&cpu, network_in.as_ref());

        let spike = SpikeDetector {
            rule: self.config.spike_rule,
            cpu_threshold_high: self.config.cpu_threshold_high,
            cpu_threshold_low: self.config.cpu_threshold_low,
        }
        .assess(&cpu, now);

        // Both are Some for a non-empty window
        let (Some(underutilization), Some(spike)) = (underutilization, spike) else {
            return Verdict::NoVerdict(NoVerdictReason::InsufficientHistory {
                qualifying: cpu.len(),
                required: self.config.min_days_to_flag,
                dropped: cpu.dropped,
            });
        };

        let (alert_level, alert_message) = match &spike.anomaly {
            Some(anomaly) => (Some(AlertLevel::High), Some(anomaly.message())),
            None => (None, None),
        };

        Verdict::Evaluated(EvaluationResult {
            resource_id: descriptor.resource_id.clone(),
            region: descriptor.region.clone(),
            resource_type: descriptor.resource_type.clone(),
            underutilized: underutilization.underutilized,
            spike_detected: spike.anomaly.is_some(),
            avg_cpu: round2(underutilization.avg_cpu),
            current_cpu: round2(spike.current),
            previous_avg_cpu: round2(spike.previous_avg),
            history_days_used: cpu.distinct_days(),
            samples_used: cpu.len(),
            samples_dropped: cpu.dropped,
            evaluated_at: now,
            recommendation: underutilization
                .underutilized
                .then(|| DOWNSIZE_RECOMMENDATION.to_string()),
            alert_level,
            alert_message,
        })
    }
}
