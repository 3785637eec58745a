//! Lookback window selection

use crate::models::MetricSample;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeSet;

/// Start and end of the window covering the most recent `days` UTC calendar
/// days, the current day included. A window reaching past the earliest
/// representable date starts there.
pub fn calendar_window(now: DateTime<Utc>, days: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let back = u64::from(days.max(1) - 1);
    let first_day = now
        .date_naive()
        .checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN);
    let since = first_day.and_time(NaiveTime::MIN).and_utc();
    (since, now)
}

/// Qualifying samples of one series inside a window
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    /// (timestamp, value) pairs in ascending timestamp order
    pub points: Vec<(DateTime<Utc>, f64)>,
    /// Samples inside the window dropped for having no usable value
    pub dropped: usize,
}

impl SampleWindow {
    /// Select the samples with `since <= timestamp <= until`.
    ///
    /// Input order does not matter; the result is ordered by timestamp with
    /// arrival order kept among equal timestamps.
    pub fn select(samples: &[MetricSample], since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        let mut window = SampleWindow::default();

        for sample in samples {
            if sample.timestamp < since || sample.timestamp > until {
                continue;
            }
            match sample.qualifying_value() {
                Some(value) => window.points.push((sample.timestamp, value)),
                None => window.dropped += 1,
            }
        }

        window.points.sort_by_key(|(ts, _)| *ts);
        window
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn mean(&self) -> Option<f64> {
        mean(&self.values())
    }

    /// Number of distinct UTC calendar days with at least one sample
    pub fn distinct_days(&self) -> u32 {
        let days: BTreeSet<_> = self.points.iter().map(|(ts, _)| ts.date_naive()).collect();
        days.len() as u32
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
