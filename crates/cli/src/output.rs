//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format dollars
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Format an RFC 3339 timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

/// Color a cost impact rank
pub fn color_rank(rank: &str) -> String {
    match rank.to_lowercase().as_str() {
        "high" => rank.red().bold().to_string(),
        "medium" => rank.yellow().to_string(),
        "low" => rank.green().to_string(),
        _ => rank.to_string(),
    }
}

/// Color a scan phase
pub fn color_phase(phase: &str) -> String {
    match phase {
        "DONE" => phase.green().to_string(),
        "CANCELLED" => phase.red().to_string(),
        _ => phase.yellow().to_string(),
    }
}
