//! Human-readable alert and report text

use crate::cost::{rank_by_impact, total_monthly};
use crate::models::{CostProjection, EvaluationResult};
use crate::scan::{ResourceOutcome, ScanReport};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Underutilized,
    CpuSpike,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Underutilized => write!(f, "underutilized"),
            AlertKind::CpuSpike => write!(f, "cpu_spike"),
        }
    }
}

/// A formatted notification for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub resource_id: String,
    pub region: String,
    pub text: String,
}

fn dollars(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

#[derive(Debug, Clone, Default)]
pub struct AlertFormatter;

impl AlertFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_underutilized(
        &self,
        result: &EvaluationResult,
        projection: Option<&CostProjection>,
    ) -> String {
        let mut text = format!(
            "Underutilized Instance: {} ({}) in {}\n\
             Avg CPU over {} days: {:.2}%\n",
            result.resource_id,
            result.resource_type,
            result.region,
            result.history_days_used,
            result.avg_cpu
        );
        if let Some(projection) = projection {
            let _ = writeln!(
                text,
                "Monthly Forecast: {}",
                dollars(projection.monthly_forecast)
            );
        }
        if let Some(recommendation) = &result.recommendation {
            let _ = writeln!(text, "Recommendation: {}", recommendation);
        }
        text.trim_end().to_string()
    }

    pub fn format_spike(&self, result: &EvaluationResult) -> String {
        let level = result
            .alert_level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "high".to_string());
        format!(
            "CPU Spike: {} ({}) in {}\n\
             From ~{:.2}% -> To {:.2}%\n\
             Alert level: {}",
            result.resource_id,
            result.resource_type,
            result.region,
            result.previous_avg_cpu,
            result.current_cpu,
            level
        )
    }

    /// One alert per flag per evaluated resource
    pub fn alerts_for(&self, report: &ScanReport) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for outcome in &report.outcomes {
            let Some(result) = outcome.verdict.result() else {
                continue;
            };
            if result.underutilized {
                alerts.push(Alert {
                    kind: AlertKind::Underutilized,
                    resource_id: result.resource_id.clone(),
                    region: result.region.clone(),
                    text: self.format_underutilized(result, Some(&outcome.projection)),
                });
            }
            if result.spike_detected {
                alerts.push(Alert {
                    kind: AlertKind::CpuSpike,
                    resource_id: result.resource_id.clone(),
                    region: result.region.clone(),
                    text: self.format_spike(result),
                });
            }
        }
        alerts
    }

    /// Summary of underutilized resources, most expensive first
    pub fn underutilized_report(&self, outcomes: &[&ResourceOutcome]) -> String {
        if outcomes.is_empty() {
            return "No underutilized resources found.".to_string();
        }

        let mut sorted: Vec<&ResourceOutcome> = outcomes.to_vec();
        sorted.sort_by(|a, b| {
            b.projection
                .monthly_forecast
                .cmp(&a.projection.monthly_forecast)
                .then_with(|| a.descriptor.resource_id.cmp(&b.descriptor.resource_id))
        });

        let mut text = format!("Underutilized resources ({})\n", sorted.len());
        for outcome in sorted {
            let avg = outcome
                .verdict
                .result()
                .map(|r| format!("{:.2}% over {} days", r.avg_cpu, r.history_days_used))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                text,
                "- {} ({}, {}): avg CPU {}, {}/mo",
                outcome.descriptor.resource_id,
                outcome.descriptor.resource_type,
                outcome.descriptor.region,
                avg,
                dollars(outcome.projection.monthly_forecast)
            );
        }
        text.trim_end().to_string()
    }

    /// The `top` most expensive resources plus the fleet total
    pub fn cost_report(&self, projections: &[CostProjection], top: usize) -> String {
        if projections.is_empty() {
            return "No cost data available.".to_string();
        }

        let mut ranked = projections.to_vec();
        rank_by_impact(&mut ranked);
        let shown = top.min(ranked.len());

        let mut text = format!("Top {} resources by projected monthly cost\n", shown);
        for (i, p) in ranked.iter().take(shown).enumerate() {
            let _ = writeln!(
                text,
                "{}. {} ({}, {}): {}/mo [{}]",
                i + 1,
                p.resource_id,
                p.resource_type,
                p.region,
                dollars(p.monthly_forecast),
                p.rank
            );
        }
        let _ = write!(
            text,
            "Fleet total: {}/mo across {} resources",
            dollars(total_monthly(projections)),
            projections.len()
        );
        text
    }
}
