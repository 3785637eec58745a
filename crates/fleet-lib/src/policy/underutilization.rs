//! Multi-day underutilization policy

use super::window::SampleWindow;

/// Outcome of the underutilization check over a qualifying window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnderutilizationAssessment {
    /// Full-precision mean CPU
    pub avg_cpu: f64,
    pub underutilized: bool,
}

/// Underutilization check.
///
/// A resource is underutilized when its mean CPU is strictly below
/// `cpu_threshold_low`. When a network gate is configured the mean inbound
/// network traffic must also be strictly below it; missing network data
/// never satisfies the gate.
#[derive(Debug, Clone, Copy)]
pub struct UnderutilizationPolicy {
    pub cpu_threshold_low: f64,
    pub network_in_threshold: Option<f64>,
}

impl UnderutilizationPolicy {
    /// Assess a non-empty CPU window. Returns `None` for an empty window.
    pub fn assess(
        &self,
        cpu: &SampleWindow,
        network_in: Option<&SampleWindow>,
    ) -> Option<UnderutilizationAssessment> {
        let avg_cpu = cpu.mean()?;
        let cpu_low = avg_cpu < self.cpu_threshold_low;

        let network_low = match self.network_in_threshold {
            None => true,
            Some(limit) => network_in
                .and_then(|w| w.mean())
                .map(|avg| avg < limit)
                .unwrap_or(false),
        };

        Some(UnderutilizationAssessment {
            avg_cpu,
            underutilized: cpu_low && network_low,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(values: &[f64]) -> SampleWindow {
        SampleWindow {
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    (
                        Utc.with_ymd_and_hms(2024, 8, 1 + i as u32, 0, 0, 0).unwrap(),
                        *v,
                    )
                })
                .collect(),
            dropped: 0,
        }
    }

    fn cpu_only() -> UnderutilizationPolicy {
        UnderutilizationPolicy {
            cpu_threshold_low: 10.0,
            network_in_threshold: None,
        }
    }

    #[test]
    fn test_exact_threshold_is_not_underutilized() {
        let result = cpu_only().assess(&window(&[10.0, 10.0, 10.0]), None).unwrap();
        assert_eq!(result.avg_cpu, 10.0);
        assert!(!result.underutilized);
    }

    #[test]
    fn test_just_below_threshold_is_underutilized() {
        let result = cpu_only()
            .assess(&window(&[9.99, 10.0, 10.0]), None)
            .unwrap();
        assert!(result.underutilized);
    }

    #[test]
    fn test_empty_window_has_no_assessment() {
        assert!(cpu_only().assess(&SampleWindow::default(), None).is_none());
    }

    #[test]
    fn test_network_gate() {
        let policy = UnderutilizationPolicy {
            cpu_threshold_low: 10.0,
            network_in_threshold: Some(100_000.0),
        };
        let cpu = window(&[2.0, 3.0, 4.0]);

        let busy_network = window(&[500_000.0, 400_000.0]);
        assert!(!policy.assess(&cpu, Some(&busy_network)).unwrap().underutilized);

        let quiet_network = window(&[1_000.0, 2_000.0]);
        assert!(policy.assess(&cpu, Some(&quiet_network)).unwrap().underutilized);

        assert!(!policy.assess(&cpu, None).unwrap().underutilized);
        assert!(!policy
            .assess(&cpu, Some(&SampleWindow::default()))
            .unwrap()
            .underutilized);
    }
}
