//! Fleet scanning
//!
//! This module provides:
//! - Collaborator interfaces (inventory, metrics, persistence, alerts)
//! - The scan orchestrator that drives one cycle across regions
//! - A periodic scan loop with jitter and graceful shutdown
//! - File-backed collaborators for running without cloud access

mod fixture;
mod r#loop;
mod orchestrator;
mod persistence;
mod retry;
mod sources;

#[cfg(test)]
mod tests;

pub use fixture::{FixtureFile, FixtureSource};
pub use orchestrator::{ScanConfig, ScanContext, ScanOrchestrator};
pub use persistence::JsonlPersistenceStore;
pub use r#loop::{ScanLoop, ScanLoopBuilder, ScanLoopConfig};
pub use retry::{retry_with_backoff, RetriesExhausted, RetryPolicy};
pub use sources::{AlertTransport, InventorySource, MetricsSource, PersistenceStore};

use crate::models::{CostProjection, EvaluationResult, MetricSample, ResourceDescriptor};
use crate::policy::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a scan cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanPhase {
    Idle,
    EnumeratingRegions,
    Scanning,
    Merging,
    Evaluating,
    Persisting,
    Done,
    Cancelled,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Idle => "IDLE",
            ScanPhase::EnumeratingRegions => "ENUMERATING_REGIONS",
            ScanPhase::Scanning => "SCANNING",
            ScanPhase::Merging => "MERGING",
            ScanPhase::Evaluating => "EVALUATING",
            ScanPhase::Persisting => "PERSISTING",
            ScanPhase::Done => "DONE",
            ScanPhase::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// A region left out of a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFailure {
    pub region: String,
    pub reason: String,
}

/// A resource left out of a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFailure {
    pub resource_id: String,
    pub region: String,
    pub reason: String,
}

/// Everything one cycle learned about one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutcome {
    pub descriptor: ResourceDescriptor,
    pub verdict: Verdict,
    pub projection: CostProjection,
    /// Samples appended to history this cycle
    #[serde(skip)]
    pub samples: Vec<MetricSample>,
}

/// Result of one scan cycle.
///
/// A cycle always yields a report. Failed regions and resources are listed
/// rather than failing the whole cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub cycle_id: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `Done`, or `Cancelled` for a cycle stopped mid-flight
    pub phase: ScanPhase,
    pub regions_scanned: Vec<String>,
    pub excluded_regions: Vec<RegionFailure>,
    pub excluded_resources: Vec<ResourceFailure>,
    /// In no particular order
    pub outcomes: Vec<ResourceOutcome>,
    /// Records that could not be persisted after retries
    pub persistence_failures: usize,
}

impl ScanReport {
    pub(crate) fn begin(cycle_id: u64) -> Self {
        let now = Utc::now();
        Self {
            cycle_id,
            started_at: now,
            finished_at: now,
            phase: ScanPhase::EnumeratingRegions,
            regions_scanned: Vec::new(),
            excluded_regions: Vec::new(),
            excluded_resources: Vec::new(),
            outcomes: Vec::new(),
            persistence_failures: 0,
        }
    }

    pub fn excluded_region_count(&self) -> usize {
        self.excluded_regions.len()
    }

    pub fn excluded_resource_count(&self) -> usize {
        self.excluded_resources.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase == ScanPhase::Cancelled
    }

    /// Evaluated resources, skipping those without a verdict
    pub fn results(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.outcomes.iter().filter_map(|o| o.verdict.result())
    }

    pub fn underutilized(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict.underutilized() == Some(true))
    }

    pub fn spikes(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results().filter(|r| r.spike_detected)
    }

    pub fn projections(&self) -> Vec<CostProjection> {
        self.outcomes.iter().map(|o| o.projection.clone()).collect()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
