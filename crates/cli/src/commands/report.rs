//! Scan report commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::unless_not_ready;
use crate::client::{ApiClient, ReportSummary, UnderutilizedResponse};
use crate::output::{
    color_phase, format_currency, format_percent, format_timestamp, print_info, print_json,
    print_table, OutputFormat,
};

#[derive(Tabled)]
struct ExclusionRow {
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Tabled)]
struct UnderutilizedRow {
    #[tabled(rename = "Resource")]
    resource_id: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Avg CPU")]
    avg_cpu: String,
    #[tabled(rename = "Days")]
    days: u32,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

fn exclusion_rows(report: &ReportSummary) -> Vec<ExclusionRow> {
    let regions = report.excluded_regions.iter().map(|r| ExclusionRow {
        scope: format!("region {}", r.region),
        reason: r.reason.clone(),
    });
    let resources = report.excluded_resources.iter().map(|r| ExclusionRow {
        scope: format!("{} ({})", r.resource_id, r.region),
        reason: r.reason.clone(),
    });
    regions.chain(resources).collect()
}

fn underutilized_rows(response: &UnderutilizedResponse) -> Vec<UnderutilizedRow> {
    response
        .resources
        .iter()
        .map(|r| UnderutilizedRow {
            resource_id: if r.expensive {
                format!("{} *", r.resource_id)
            } else {
                r.resource_id.clone()
            },
            resource_type: r.resource_type.clone(),
            region: r.region.clone(),
            avg_cpu: format_percent(r.avg_cpu),
            days: r.history_days_used,
            monthly: format_currency(r.monthly_forecast),
        })
        .collect()
}

/// Show a summary of the latest scan cycle
pub async fn show_report(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let Some(report) = unless_not_ready(client.report().await)? else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", format!("Scan Cycle {}", report.cycle_id).bold());
            println!("{}", "=".repeat(50));
            println!("Phase:                  {}", color_phase(&report.phase));
            println!(
                "Finished:               {} ({:.1}s)",
                format_timestamp(&report.finished_at),
                report.duration_secs
            );
            println!("Regions scanned:        {}", report.regions_scanned.join(", "));
            println!();

            println!("{}", "Resources".bold());
            println!("{}", "-".repeat(50));
            println!("Evaluated:              {}", report.resources_evaluated);
            println!("Without verdict:        {}", report.resources_without_verdict);
            println!(
                "Underutilized:          {}",
                report.underutilized.to_string().yellow()
            );
            println!("CPU spikes:             {}", report.spikes.to_string().red());
            println!(
                "Monthly forecast:       {}",
                format_currency(report.fleet_monthly_forecast).bold()
            );
            if report.persistence_failures > 0 {
                println!(
                    "Persistence failures:   {}",
                    report.persistence_failures.to_string().red()
                );
            }

            let exclusions = exclusion_rows(&report);
            if !exclusions.is_empty() {
                println!();
                println!("{}", "Excluded".bold());
                println!("{}", "-".repeat(50));
                print_table(&exclusions);
            }
        }
    }

    Ok(())
}

/// Show underutilized resources, most expensive first
pub async fn show_underutilized(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let Some(response) = unless_not_ready(client.underutilized().await)? else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            if response.resources.is_empty() {
                print_info("No underutilized resources found.");
                return Ok(());
            }

            println!(
                "{}",
                format!("Underutilized Resources ({})", response.resources.len()).bold()
            );
            print_table(&underutilized_rows(&response));
            if response.resources.iter().any(|r| r.expensive) {
                println!("{}", "* costs more than $10/month".dimmed());
            }
            if let Some(recommendation) = response
                .resources
                .iter()
                .find_map(|r| r.recommendation.as_deref())
            {
                println!();
                println!("{} {}", "Recommendation:".bold(), recommendation);
            }
        }
    }

    Ok(())
}
