//! File-backed inventory and metrics
//!
//! Serves resources and samples from a JSON document so the scanner can run
//! without cloud credentials:
//!
//! ```json
//! {
//!   "regions": { "us-east-1": [ { "resource_id": "i-1", ... } ] },
//!   "samples": [ { "resource_id": "i-1", "kind": "CPU_UTILIZATION", ... } ]
//! }
//! ```

use super::sources::{InventorySource, MetricsSource};
use crate::models::{MetricKind, MetricSample, ResourceDescriptor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFile {
    /// Resources keyed by region
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<ResourceDescriptor>>,
    #[serde(default)]
    pub samples: Vec<MetricSample>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    fixture: FixtureFile,
}

impl FixtureSource {
    pub fn new(fixture: FixtureFile) -> Self {
        Self { fixture }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture: FixtureFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        Ok(Self::new(fixture))
    }

    pub fn resource_count(&self) -> usize {
        self.fixture.regions.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl InventorySource for FixtureSource {
    async fn list_regions(&self) -> Result<Vec<String>> {
        Ok(self.fixture.regions.keys().cloned().collect())
    }

    async fn list_resources(&self, region: &str) -> Result<Vec<ResourceDescriptor>> {
        Ok(self
            .fixture
            .regions
            .get(region)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MetricsSource for FixtureSource {
    /// Samples no older than `lookback_days` before the current time
    async fn fetch_recent(
        &self,
        resource_id: &str,
        kind: MetricKind,
        lookback_days: u32,
    ) -> Result<Vec<MetricSample>> {
        let since = Utc::now()
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut samples: Vec<MetricSample> = self
            .fixture
            .samples
            .iter()
            .filter(|s| s.resource_id == resource_id && s.kind == kind && s.timestamp >= since)
            .cloned()
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }
}
