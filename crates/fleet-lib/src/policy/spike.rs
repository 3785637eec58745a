//! CPU spike detection
//!
//! The default rule flags a transition from a low baseline to a high current
//! value: the last sample in the window must exceed the high threshold while
//! the mean of every earlier sample stays below the low threshold. A large
//! delta between two already-busy readings is not a spike.
//!
//! [`SpikeRule::AbsoluteJump`] is an alternative rule that flags any rise of
//! more than `min_jump` percentage points between the first and last sample
//! of a short lookback. It is opt-in and never combined with the default.

use super::window::{mean, SampleWindow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default percentage-point jump for the absolute-jump rule
pub const DEFAULT_JUMP_THRESHOLD: f64 = 50.0;

/// Default lookback for the absolute-jump rule
pub const DEFAULT_JUMP_LOOKBACK_HOURS: i64 = 24;

/// Which definition of "spike" to apply
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpikeRule {
    /// Low baseline followed by a high current value
    #[default]
    ThresholdCrossing,
    /// Rise of more than `min_jump` points within the last `lookback_hours`
    AbsoluteJump { min_jump: f64, lookback_hours: i64 },
}

impl SpikeRule {
    pub fn absolute_jump() -> Self {
        SpikeRule::AbsoluteJump {
            min_jump: DEFAULT_JUMP_THRESHOLD,
            lookback_hours: DEFAULT_JUMP_LOOKBACK_HOURS,
        }
    }
}

/// Detects CPU spikes within an evaluation window
#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    pub rule: SpikeRule,
    /// Current value must be strictly above this
    pub cpu_threshold_high: f64,
    /// Baseline must be strictly below this
    pub cpu_threshold_low: f64,
}

/// Statistics the spike check derives, whether or not a spike was found
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeAssessment {
    /// Last sample in the window, by timestamp
    pub current: f64,
    /// Mean of all samples but the last (equals `current` with one sample)
    pub previous_avg: f64,
    pub anomaly: Option<SpikeAnomaly>,
}

/// CPU spike anomaly details
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeAnomaly {
    /// Value the spike was measured from
    pub baseline: f64,
    /// Value that triggered the spike
    pub current: f64,
    pub rule: SpikeRule,
}

impl SpikeAnomaly {
    /// Rise in percentage points
    pub fn jump(&self) -> f64 {
        self.current - self.baseline
    }

    pub fn message(&self) -> String {
        format!(
            "CPU spike: from ~{:.2}% to {:.2}% (+{:.2} points)",
            self.baseline,
            self.current,
            self.jump()
        )
    }
}

impl SpikeDetector {
    /// Assess a window. Returns `None` for an empty window.
    pub fn assess(&self, window: &SampleWindow, now: DateTime<Utc>) -> Option<SpikeAssessment> {
        let (_, current) = *window.points.last()?;
        let earlier: Vec<f64> = window.points[..window.points.len() - 1]
            .iter()
            .map(|(_, v)| *v)
            .collect();
        // Fewer than two samples: the baseline is the sample itself
        let previous_avg = mean(&earlier).unwrap_or(current);

        let anomaly = match self.rule {
            SpikeRule::ThresholdCrossing => {
                if current > self.cpu_threshold_high && previous_avg < self.cpu_threshold_low {
                    Some(SpikeAnomaly {
                        baseline: previous_avg,
                        current,
                        rule: self.rule,
                    })
                } else {
                    None
                }
            }
            SpikeRule::AbsoluteJump {
                min_jump,
                lookback_hours,
            } => {
                let cutoff = Duration::try_hours(lookback_hours)
                    .and_then(|span| now.checked_sub_signed(span))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                let recent: Vec<f64> = window
                    .points
                    .iter()
                    .filter(|(ts, _)| *ts > cutoff)
                    .map(|(_, v)| *v)
                    .collect();
                match (recent.first(), recent.last()) {
                    (Some(first), Some(last)) if recent.len() >= 2 && last - first > min_jump => {
                        Some(SpikeAnomaly {
                            baseline: *first,
                            current: *last,
                            rule: self.rule,
                        })
                    }
                    _ => None,
                }
            }
        };

        Some(SpikeAssessment {
            current,
            previous_avg,
            anomaly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 18, 0, 0).unwrap()
    }

    fn daily(values: &[f64]) -> SampleWindow {
        let n = values.len() as i64;
        SampleWindow {
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (now() - Duration::days(n - 1 - i as i64), *v))
                .collect(),
            dropped: 0,
        }
    }

    fn crossing() -> SpikeDetector {
        SpikeDetector {
            rule: SpikeRule::ThresholdCrossing,
            cpu_threshold_high: 80.0,
            cpu_threshold_low: 10.0,
        }
    }

    #[test]
    fn test_spike_from_low_baseline() {
        let result = crossing().assess(&daily(&[5.0, 6.0, 95.0]), now()).unwrap();
        assert_eq!(result.current, 95.0);
        assert_eq!(result.previous_avg, 5.5);

        let anomaly = result.anomaly.expect("spike expected");
        assert_eq!(anomaly.baseline, 5.5);
        assert_eq!(anomaly.jump(), 89.5);
        assert!(anomaly.message().contains("95.00%"));
    }

    #[test]
    fn test_no_spike_from_busy_baseline() {
        let result = crossing()
            .assess(&daily(&[85.0, 87.0, 90.0]), now())
            .unwrap();
        assert_eq!(result.current, 90.0);
        assert_eq!(result.previous_avg, 86.0);
        assert!(result.anomaly.is_none());
    }

    #[test]
    fn test_single_sample_cannot_spike() {
        let result = crossing().assess(&daily(&[99.0]), now()).unwrap();
        assert_eq!(result.previous_avg, 99.0);
        assert!(result.anomaly.is_none());
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert!(crossing()
            .assess(&daily(&[5.0, 80.0]), now())
            .unwrap()
            .anomaly
            .is_none());
        assert!(crossing()
            .assess(&daily(&[10.0, 95.0]), now())
            .unwrap()
            .anomaly
            .is_none());
    }

    #[test]
    fn test_empty_window() {
        assert!(crossing().assess(&SampleWindow::default(), now()).is_none());
    }

    #[test]
    fn test_absolute_jump_variant() {
        let detector = SpikeDetector {
            rule: SpikeRule::absolute_jump(),
            ..crossing()
        };

        // Busy-to-busier is a jump under this rule
        let mut window = SampleWindow {
            points: vec![
                (now() - Duration::hours(20), 30.0),
                (now() - Duration::hours(1), 85.0),
            ],
            dropped: 0,
        };
        let anomaly = detector.assess(&window, now()).unwrap().anomaly.unwrap();
        assert_eq!(anomaly.baseline, 30.0);
        assert_eq!(anomaly.current, 85.0);

        // Outside the lookback only one sample remains
        window.points[0].0 = now() - Duration::hours(30);
        assert!(detector.assess(&window, now()).unwrap().anomaly.is_none());
    }

    #[test]
    fn test_unbounded_jump_lookback_covers_whole_window() {
        let detector = SpikeDetector {
            rule: SpikeRule::AbsoluteJump {
                min_jump: 50.0,
                lookback_hours: i64::MAX,
            },
            ..crossing()
        };

        let result = detector.assess(&daily(&[10.0, 20.0, 70.0]), now()).unwrap();
        assert_eq!(result.anomaly.unwrap().baseline, 10.0);
    }

    #[test]
    fn test_rule_serde_shape() {
        let json = serde_json::to_value(SpikeRule::absolute_jump()).unwrap();
        assert_eq!(json["type"], "absolute_jump");
        assert_eq!(json["min_jump"], 50.0);

        let rule: SpikeRule = serde_json::from_str(r#"{"type":"threshold_crossing"}"#).unwrap();
        assert_eq!(rule, SpikeRule::ThresholdCrossing);
    }
}
