//! Metrics history store
//!
//! Append-only per-resource time series of utilization samples. Two
//! implementations are provided:
//! - [`InMemoryHistoryStore`] backed by a concurrent map
//! - [`JsonlHistoryStore`] which additionally appends every sample to a
//!   JSON-lines file and reloads it on open

mod file;
mod memory;

pub use file::JsonlHistoryStore;
pub use memory::InMemoryHistoryStore;

use crate::error::FleetResult;
use crate::models::{MetricKind, MetricSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of a resource's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub samples: Vec<MetricSample>,
    /// Offset of the next page, `None` on the last page
    pub next_offset: Option<usize>,
}

/// Storage for metric samples.
///
/// Samples for one (resource, kind) series are kept in ascending timestamp
/// order. Samples sharing a timestamp are independent rows: appending the
/// same sample twice stores it twice. Unknown resources read as empty.
pub trait MetricsHistoryStore: Send + Sync {
    /// Append one sample to its series
    fn append(&self, sample: MetricSample) -> FleetResult<()>;

    /// Full ascending history of one series
    fn history(&self, resource_id: &str, kind: MetricKind) -> Vec<MetricSample>;

    /// Number of samples stored for one series
    fn series_len(&self, resource_id: &str, kind: MetricKind) -> usize {
        self.history(resource_id, kind).len()
    }

    /// Samples with `since <= timestamp <= until`, ascending
    fn window(
        &self,
        resource_id: &str,
        kind: MetricKind,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<MetricSample> {
        self.history(resource_id, kind)
            .into_iter()
            .filter(|s| s.timestamp >= since && s.timestamp <= until)
            .collect()
    }

    /// Paged read of one series, for large histories
    fn history_page(
        &self,
        resource_id: &str,
        kind: MetricKind,
        offset: usize,
        limit: usize,
    ) -> HistoryPage {
        let all = self.history(resource_id, kind);
        paginate(&all, offset, limit)
    }
}

pub(crate) fn paginate(series: &[MetricSample], offset: usize, limit: usize) -> HistoryPage {
    let start = offset.min(series.len());
    let end = start.saturating_add(limit).min(series.len());
    HistoryPage {
        samples: series[start..end].to_vec(),
        next_offset: if end < series.len() { Some(end) } else { None },
    }
}
