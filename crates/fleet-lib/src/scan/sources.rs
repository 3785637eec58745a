//! Collaborator interfaces used by the scan pipeline
//!
//! Every method returns `anyhow::Result`; the orchestrator wraps each call in
//! a timeout and folds failures into [`crate::error::FleetError`].

use crate::models::{MetricKind, MetricSample, ResourceCostRecord, ResourceDescriptor, ResourceSnapshot};
use async_trait::async_trait;

/// Enumerates compute resources
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Regions available to scan
    async fn list_regions(&self) -> anyhow::Result<Vec<String>>;

    /// Resources in one region. An empty list is a valid answer.
    async fn list_resources(&self, region: &str) -> anyhow::Result<Vec<ResourceDescriptor>>;
}

/// Fetches recent utilization samples
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Samples for one series over the last `lookback_days` days. Periods
    /// without data may be returned as samples with an absent value.
    async fn fetch_recent(
        &self,
        resource_id: &str,
        kind: MetricKind,
        lookback_days: u32,
    ) -> anyhow::Result<Vec<MetricSample>>;
}

/// Durable sink for scan output.
///
/// Appends must be safe to retry: a retried append may produce a duplicate
/// row but never a partial one.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> anyhow::Result<()>;

    async fn append_cost_record(&self, record: &ResourceCostRecord) -> anyhow::Result<()>;
}

/// Delivers alert text to humans. Callers do not wait on delivery outcome
/// beyond logging it.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    async fn send_alert(&self, text: &str) -> anyhow::Result<()>;
}
