//! In-memory history store

use super::{paginate, HistoryPage, MetricsHistoryStore};
use crate::error::FleetResult;
use crate::models::{MetricKind, MetricSample};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

type SeriesKey = (String, MetricKind);

/// Concurrent in-memory history store
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    series: DashMap<SeriesKey, Vec<MetricSample>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of series (resource, kind pairs) held
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of samples across all series
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.value().len()).sum()
    }
}

impl MetricsHistoryStore for InMemoryHistoryStore {
    fn append(&self, sample: MetricSample) -> FleetResult<()> {
        trace!(
            resource_id = %sample.resource_id,
            kind = %sample.kind,
            "Appending sample"
        );
        let mut series = self
            .series
            .entry((sample.resource_id.clone(), sample.kind))
            .or_default();

        // Equal timestamps land after the existing ones, so arrival order is
        // preserved among duplicates.
        let idx = series.partition_point(|s| s.timestamp <= sample.timestamp);
        series.insert(idx, sample);
        Ok(())
    }

    fn history(&self, resource_id: &str, kind: MetricKind) -> Vec<MetricSample> {
        self.series
            .get(&(resource_id.to_string(), kind))
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    fn series_len(&self, resource_id: &str, kind: MetricKind) -> usize {
        self.series
            .get(&(resource_id.to_string(), kind))
            .map(|s| s.value().len())
            .unwrap_or(0)
    }

    fn window(
        &self,
        resource_id: &str,
        kind: MetricKind,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<MetricSample> {
        let Some(series) = self.series.get(&(resource_id.to_string(), kind)) else {
            return Vec::new();
        };
        let start = series.partition_point(|s| s.timestamp < since);
        let end = series.partition_point(|s| s.timestamp <= until);
        if start >= end {
            return Vec::new();
        }
        series.value()[start..end].to_vec()
    }

    fn history_page(
        &self,
        resource_id: &str,
        kind: MetricKind,
        offset: usize,
        limit: usize,
    ) -> HistoryPage {
        match self.series.get(&(resource_id.to_string(), kind)) {
            Some(series) => paginate(series.value(), offset, limit),
            None => HistoryPage {
                samples: Vec::new(),
                next_offset: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn cpu(id: &str, day: u32, value: f64) -> MetricSample {
        MetricSample::new(id, MetricKind::CpuUtilization, ts(day), Some(value))
    }

    #[test]
    fn test_unknown_resource_is_empty() {
        let store = InMemoryHistoryStore::new();
        assert!(store.history("i-missing", MetricKind::CpuUtilization).is_empty());
        assert_eq!(store.series_len("i-missing", MetricKind::NetworkIn), 0);
        let page = store.history_page("i-missing", MetricKind::CpuUtilization, 0, 10);
        assert!(page.samples.is_empty());
        assert!(page.next_offset.is_none());
    }

    #[test]
    fn test_out_of_order_appends_read_back_sorted() {
        let store = InMemoryHistoryStore::new();
        store.append(cpu("i-1", 3, 30.0)).unwrap();
        store.append(cpu("i-1", 1, 10.0)).unwrap();
        store.append(cpu("i-1", 2, 20.0)).unwrap();

        let values: Vec<_> = store
            .history("i-1", MetricKind::CpuUtilization)
            .iter()
            .map(|s| s.value.unwrap())
            .collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_duplicate_appends_are_kept() {
        let store = InMemoryHistoryStore::new();
        let sample = cpu("i-1", 1, 5.0);
        store.append(sample.clone()).unwrap();
        store.append(sample.clone()).unwrap();

        let history = store.history("i-1", MetricKind::CpuUtilization);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], history[1]);
        assert_eq!(store.sample_count(), 2);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let store = InMemoryHistoryStore::new();
        store.append(cpu("i-1", 1, 1.0)).unwrap();
        store.append(cpu("i-1", 1, 2.0)).unwrap();
        store.append(cpu("i-1", 1, 3.0)).unwrap();

        let values: Vec<_> = store
            .history("i-1", MetricKind::CpuUtilization)
            .iter()
            .map(|s| s.value.unwrap())
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_series_are_separated_by_kind() {
        let store = InMemoryHistoryStore::new();
        store.append(cpu("i-1", 1, 5.0)).unwrap();
        store
            .append(MetricSample::new("i-1", MetricKind::NetworkIn, ts(1), Some(1e6)))
            .unwrap();

        assert_eq!(store.series_len("i-1", MetricKind::CpuUtilization), 1);
        assert_eq!(store.series_len("i-1", MetricKind::NetworkIn), 1);
        assert_eq!(store.series_len("i-1", MetricKind::NetworkOut), 0);
        assert_eq!(store.series_count(), 2);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let store = InMemoryHistoryStore::new();
        for day in 1..=10 {
            store.append(cpu("i-1", day, day as f64)).unwrap();
        }

        let window = store.window("i-1", MetricKind::CpuUtilization, ts(4), ts(6));
        let values: Vec<_> = window.iter().map(|s| s.value.unwrap()).collect();
        assert_eq!(values, vec![4.0, 5.0, 6.0]);

        let empty = store.window(
            "i-1",
            MetricKind::CpuUtilization,
            ts(10) + Duration::hours(1),
            ts(10) + Duration::hours(2),
        );
        assert!(empty.is_empty());
    }

    #[test]
    fn test_history_pages() {
        let store = InMemoryHistoryStore::new();
        for day in 1..=5 {
            store.append(cpu("i-1", day, day as f64)).unwrap();
        }

        let first = store.history_page("i-1", MetricKind::CpuUtilization, 0, 2);
        assert_eq!(first.samples.len(), 2);
        assert_eq!(first.next_offset, Some(2));

        let last = store.history_page("i-1", MetricKind::CpuUtilization, 4, 2);
        assert_eq!(last.samples.len(), 1);
        assert_eq!(last.next_offset, None);

        let beyond = store.history_page("i-1", MetricKind::CpuUtilization, 50, 2);
        assert!(beyond.samples.is_empty());
    }

    #[test]
    fn test_concurrent_appends() {
        let store = std::sync::Arc::new(InMemoryHistoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for day in 1..=10 {
                        store.append(cpu("i-shared", day, t as f64)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.history("i-shared", MetricKind::CpuUtilization);
        assert_eq!(history.len(), 80);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
