//! Cost-related CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::unless_not_ready;
use crate::client::{ApiClient, CostsResponse};
use crate::output::{color_rank, format_currency, print_json, print_table, OutputFormat};

/// Row for the ranked cost table
#[derive(Tabled)]
struct CostRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Resource")]
    resource_id: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Hourly")]
    hourly: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Impact")]
    rank: String,
    #[tabled(rename = "Note")]
    note: String,
}

fn cost_rows(costs: &CostsResponse) -> Vec<CostRow> {
    costs
        .resources
        .iter()
        .enumerate()
        .map(|(i, c)| CostRow {
            position: i + 1,
            resource_id: c.resource_id.clone(),
            resource_type: c.resource_type.clone(),
            region: c.region.clone(),
            hourly: format!("${:.4}", c.hourly_rate),
            monthly: format_currency(c.monthly_forecast),
            rank: color_rank(&c.rank),
            note: note(c.expensive_underutilized, &c.rate_source),
        })
        .collect()
}

fn note(expensive_underutilized: bool, rate_source: &str) -> String {
    match (expensive_underutilized, rate_source) {
        (true, _) => "expensive & idle".to_string(),
        (false, "unavailable") => "no price".to_string(),
        _ => String::new(),
    }
}

/// Show the most expensive resources of the latest cycle
pub async fn show_costs(
    client: &ApiClient,
    top: Option<usize>,
    region: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let Some(costs) = unless_not_ready(client.costs(top, region.clone()).await)? else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&costs)?,
        OutputFormat::Table => {
            let scope = region.as_deref().unwrap_or("all regions");
            println!(
                "{} ({}, cycle {})",
                "Projected Monthly Cost".bold(),
                scope.cyan(),
                costs.cycle_id
            );
            println!("{}", "=".repeat(50));
            print_table(&cost_rows(&costs));
            println!();
            println!(
                "{} {} across {} resources",
                "Total:".bold(),
                format_currency(costs.total_monthly_forecast).bold(),
                costs.resource_count
            );
            if costs.resources.len() < costs.resource_count {
                println!(
                    "{}",
                    format!(
                        "Showing top {} of {}",
                        costs.resources.len(),
                        costs.resource_count
                    )
                    .dimmed()
                );
            }
        }
    }

    Ok(())
}
