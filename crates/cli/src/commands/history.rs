//! Metric history commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, Sample};
use crate::output::{format_timestamp, print_json, print_table, OutputFormat};

/// Page size used with `--all`
const PAGE_SIZE: usize = 1000;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn sample_rows(samples: &[Sample]) -> Vec<SampleRow> {
    samples
        .iter()
        .map(|s| SampleRow {
            timestamp: format_timestamp(&s.timestamp),
            value: s
                .value
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

/// Show stored samples for one resource
pub async fn show_history(
    client: &ApiClient,
    resource_id: &str,
    kind: Option<String>,
    offset: usize,
    limit: usize,
    all: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut page = client
        .history(resource_id, kind.clone(), offset, if all { PAGE_SIZE } else { limit })
        .await?;

    if all {
        while let Some(next) = page.next_offset {
            let more = client.history(resource_id, kind.clone(), next, PAGE_SIZE).await?;
            page.samples.extend(more.samples);
            page.next_offset = more.next_offset;
        }
    }

    match format {
        OutputFormat::Json => print_json(&page)?,
        OutputFormat::Table => {
            println!(
                "{} {} ({})",
                "History for".bold(),
                page.resource_id.cyan(),
                page.kind
            );
            print_table(&sample_rows(&page.samples));
            if let Some(next) = page.next_offset {
                println!(
                    "{}",
                    format!("More samples available, continue with --offset {}", next).dimmed()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values_are_not_zero() {
        let samples = vec![
            Sample {
                resource_id: "i-1".to_string(),
                kind: "CPU_UTILIZATION".to_string(),
                timestamp: "2026-10-18T00:00:00Z".to_string(),
                value: Some(0.0),
            },
            Sample {
                resource_id: "i-1".to_string(),
                kind: "CPU_UTILIZATION".to_string(),
                timestamp: "2026-10-19T00:00:00Z".to_string(),
                value: None,
            },
        ];

        let rows = sample_rows(&samples);
        assert_eq!(rows[0].value, "0.00");
        assert_eq!(rows[1].value, "-");
        assert_eq!(rows[1].timestamp, "2026-10-19 00:00:00");
    }
}
