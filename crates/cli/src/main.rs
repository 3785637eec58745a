//! Fleet scanner CLI
//!
//! A command-line tool for reading scan reports, cost rankings and metric
//! history from a running fleet scanner.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{costs, history, report};

/// Fleet scanner CLI
#[derive(Parser)]
#[command(name = "fleetctl")]
#[command(author, version, about = "CLI for the fleet utilization scanner", long_about = None)]
pub struct Cli {
    /// Scanner API URL (also FLEETCTL_API_URL; falls back to the config file)
    #[arg(long, env = "FLEETCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summary of the latest scan cycle
    Report,

    /// Most expensive resources by projected monthly cost
    Costs {
        /// Number of resources to show
        #[arg(long, short)]
        top: Option<usize>,

        /// Only resources in this region
        #[arg(long, short)]
        region: Option<String>,
    },

    /// Resources flagged as underutilized
    Underutilized,

    /// Stored metric samples for a resource
    History {
        /// Resource ID
        resource_id: String,

        /// Metric kind (cpu_utilization, network_in, network_out)
        #[arg(long, short)]
        kind: Option<String>,

        /// Skip this many samples
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum samples to show
        #[arg(long, default_value_t = 100)]
        limit: usize,

        /// Fetch every page
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    // Initialize client
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url.as_deref()))?;

    // Execute command
    match cli.command {
        Commands::Report => {
            report::show_report(&client, cli.format).await?;
        }
        Commands::Costs { top, region } => {
            let top = top.or(config.default_top);
            let region = region.or(config.default_region);
            costs::show_costs(&client, top, region, cli.format).await?;
        }
        Commands::Underutilized => {
            report::show_underutilized(&client, cli.format).await?;
        }
        Commands::History {
            resource_id,
            kind,
            offset,
            limit,
            all,
        } => {
            history::show_history(&client, &resource_id, kind, offset, limit, all, cli.format)
                .await?;
        }
    }

    Ok(())
}
