//! Core data models for the fleet scanner

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state of a compute resource at scan time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Running,
    Stopped,
    Terminated,
    #[serde(other)]
    Other,
}

impl LifecycleState {
    /// States that never receive a policy verdict
    pub fn is_inactive(&self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopped => write!(f, "stopped"),
            LifecycleState::Terminated => write!(f, "terminated"),
            LifecycleState::Other => write!(f, "other"),
        }
    }
}

/// Identity snapshot of one compute resource, as enumerated in one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Unique within a region
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub state: LifecycleState,
    pub launched_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Kind of utilization metric tracked per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    CpuUtilization,
    NetworkIn,
    NetworkOut,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::CpuUtilization,
        MetricKind::NetworkIn,
        MetricKind::NetworkOut,
    ];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::CpuUtilization => write!(f, "CPU_UTILIZATION"),
            MetricKind::NetworkIn => write!(f, "NETWORK_IN"),
            MetricKind::NetworkOut => write!(f, "NETWORK_OUT"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CPU_UTILIZATION" | "CPU" => Ok(MetricKind::CpuUtilization),
            "NETWORK_IN" => Ok(MetricKind::NetworkIn),
            "NETWORK_OUT" => Ok(MetricKind::NetworkOut),
            other => Err(format!("unknown metric kind: {}", other)),
        }
    }
}

/// One observation of a metric.
///
/// `value` is `None` when the metrics API reported a datapoint without a
/// usable number. It is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub resource_id: String,
    pub kind: MetricKind,
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl MetricSample {
    pub fn new(
        resource_id: impl Into<String>,
        kind: MetricKind,
        timestamp: DateTime<Utc>,
        value: Option<f64>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            kind,
            timestamp,
            value,
        }
    }

    /// The value, if it is a usable finite number
    pub fn qualifying_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Alert level attached to an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    High,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::High => write!(f, "high"),
        }
    }
}

/// Policy verdict for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub underutilized: bool,
    pub spike_detected: bool,
    /// Mean CPU over the window, rounded to 2 decimals
    pub avg_cpu: f64,
    /// Last CPU sample in the window, rounded to 2 decimals
    pub current_cpu: f64,
    /// Mean of all window samples but the last, rounded to 2 decimals
    pub previous_avg_cpu: f64,
    /// Distinct UTC calendar days covered by qualifying samples
    pub history_days_used: u32,
    pub samples_used: usize,
    /// Samples in the window dropped for having no usable value
    pub samples_dropped: usize,
    pub evaluated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_level: Option<AlertLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
}

/// Coarse bucket of projected monthly spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostImpactRank {
    Low,
    Medium,
    High,
}

impl fmt::Display for CostImpactRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostImpactRank::Low => write!(f, "low"),
            CostImpactRank::Medium => write!(f, "medium"),
            CostImpactRank::High => write!(f, "high"),
        }
    }
}

/// Where an hourly rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Spot,
    OnDemand,
    /// Both lookups failed or returned no data; the rate is zero
    Unavailable,
}

/// Monetary projection for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostProjection {
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub hourly_rate: Decimal,
    pub rate_source: RateSource,
    pub daily_forecast: Decimal,
    pub weekly_forecast: Decimal,
    pub monthly_forecast: Decimal,
    pub rank: CostImpactRank,
    /// `None` when the evaluator produced no verdict
    pub underutilized: Option<bool>,
}

/// Persisted view of one resource as seen by one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub descriptor: ResourceDescriptor,
    /// Samples appended to the history store during this scan
    pub samples: Vec<MetricSample>,
}

/// Stable persisted record joining a resource with its cost projection.
///
/// Reporting tooling reads this layout; fields are only ever added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCostRecord {
    pub timestamp: DateTime<Utc>,
    pub resource_id: String,
    pub region: String,
    pub resource_type: String,
    pub state: LifecycleState,
    pub hourly_rate: Decimal,
    pub monthly_forecast: Decimal,
    pub rank: CostImpactRank,
    pub underutilized: Option<bool>,
    pub cpu_utilization: Option<f64>,
    pub network_in: Option<f64>,
    pub network_out: Option<f64>,
    pub tags: HashMap<String, String>,
}

impl ResourceCostRecord {
    /// Assemble a complete record from the pieces of one resource scan
    pub fn assemble(
        timestamp: DateTime<Utc>,
        descriptor: &ResourceDescriptor,
        projection: &CostProjection,
        samples: &[MetricSample],
    ) -> Self {
        let latest = |kind: MetricKind| {
            samples
                .iter()
                .filter(|s| s.kind == kind)
                .max_by_key(|s| s.timestamp)
                .and_then(|s| s.qualifying_value())
        };

        Self {
            timestamp,
            resource_id: descriptor.resource_id.clone(),
            region: descriptor.region.clone(),
            resource_type: descriptor.resource_type.clone(),
            state: descriptor.state,
            hourly_rate: projection.hourly_rate,
            monthly_forecast: projection.monthly_forecast,
            rank: projection.rank,
            underutilized: projection.underutilized,
            cpu_utilization: latest(MetricKind::CpuUtilization),
            network_in: latest(MetricKind::NetworkIn),
            network_out: latest(MetricKind::NetworkOut),
            tags: descriptor.tags.clone(),
        }
    }
}

/// Round a displayed percentage to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
