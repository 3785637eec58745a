//! Scanner configuration
//!
//! Values come from serde defaults, then an optional file named by
//! `FLEET_CONFIG`, then `FLEET_*` environment variables. Nested keys use a
//! double underscore, e.g. `FLEET_POLICY__CPU_THRESHOLD_LOW=5`.

use anyhow::{ensure, Context, Result};
use fleet_lib::cost::StaticRate;
use fleet_lib::policy::{PolicyConfig, SpikeRule};
use fleet_lib::scan::{RetryPolicy, ScanConfig, ScanLoopConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "FLEET_CONFIG";

/// Longest evaluation history the scanner accepts
pub const MAX_HISTORY_DAYS: u32 = 366;

/// Longest absolute-jump spike lookback the scanner accepts
pub const MAX_SPIKE_LOOKBACK_HOURS: i64 = 7 * 24;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Identifies this scanner in logs
    pub scanner_id: String,

    /// Regions to scan; discovered from the inventory when empty
    pub regions: Vec<String>,
    pub default_region: String,

    /// API server port for health/metrics/report endpoints
    pub api_port: u16,

    pub scan_interval_secs: u64,
    pub scan_jitter_secs: u64,
    /// Bound on every collaborator call
    pub call_timeout_secs: u64,
    pub region_concurrency: usize,
    pub resource_concurrency: usize,
    pub persistence_max_attempts: u32,
    /// Time in-flight writes get to finish when a cycle is cancelled
    pub persist_grace_secs: u64,

    /// JSON-lines history file; history is kept in memory when unset
    pub history_path: Option<PathBuf>,
    /// Directory for snapshot and cost record files
    pub persistence_dir: PathBuf,
    /// Inventory and metrics fixture
    pub fixture_path: Option<PathBuf>,
    /// Static price table
    pub pricing: Vec<StaticRate>,

    /// Chat webhook for alerts; alerts are logged when unset
    pub webhook_url: Option<String>,
    pub alert_dedup_hours: u64,

    pub policy: PolicyConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scanner_id: "fleet-scanner".to_string(),
            regions: Vec::new(),
            default_region: "us-east-1".to_string(),
            api_port: 8080,
            scan_interval_secs: 3600,
            scan_jitter_secs: 30,
            call_timeout_secs: 30,
            region_concurrency: 10,
            resource_concurrency: 16,
            persistence_max_attempts: 3,
            persist_grace_secs: 10,
            history_path: None,
            persistence_dir: PathBuf::from("fleet-data"),
            fixture_path: None,
            pricing: Vec::new(),
            webhook_url: None,
            alert_dedup_hours: 6,
            policy: PolicyConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::from_sources(file.as_deref(), environment())
    }

    pub fn from_sources(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(env)
            .build()
            .context("Failed to read scanner configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid scanner configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot describe a real evaluation window
    pub fn validate(&self) -> Result<()> {
        let history_days = self.policy.history_days;
        ensure!(
            (1..=MAX_HISTORY_DAYS).contains(&history_days),
            "policy.history_days must be between 1 and {}, got {}",
            MAX_HISTORY_DAYS,
            history_days
        );
        if let SpikeRule::AbsoluteJump { lookback_hours, .. } = self.policy.spike_rule {
            ensure!(
                (1..=MAX_SPIKE_LOOKBACK_HOURS).contains(&lookback_hours),
                "policy.spike_rule.lookback_hours must be between 1 and {}, got {}",
                MAX_SPIKE_LOOKBACK_HOURS,
                lookback_hours
            );
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn alert_dedup_window(&self) -> Duration {
        Duration::from_secs(self.alert_dedup_hours * 60 * 60)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            regions: self.regions.clone(),
            default_region: self.default_region.clone(),
            region_concurrency: self.region_concurrency.max(1),
            resource_concurrency: self.resource_concurrency.max(1),
            call_timeout: self.call_timeout(),
            persistence_retry: RetryPolicy {
                max_attempts: self.persistence_max_attempts.max(1),
                ..RetryPolicy::default()
            },
            persist_grace: Duration::from_secs(self.persist_grace_secs),
        }
    }

    pub fn loop_config(&self) -> ScanLoopConfig {
        ScanLoopConfig {
            interval: Duration::from_secs(self.scan_interval_secs),
            jitter: Duration::from_secs(self.scan_jitter_secs),
            ..ScanLoopConfig::default()
        }
    }
}

/// `FLEET_*` variables, with comma-separated region lists
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("FLEET")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("regions")
}
