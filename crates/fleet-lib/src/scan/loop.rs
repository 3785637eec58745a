//! Periodic scan loop
//!
//! Runs a scan cycle immediately, then again after every interval (plus
//! jitter) until shutdown. Completed reports are sent on a channel.

use super::{ScanOrchestrator, ScanReport};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScanLoopConfig {
    /// Delay between the end of one cycle and the start of the next (default: 1 hour)
    pub interval: Duration,
    /// Maximum jitter added to the interval (default: 30 seconds)
    pub jitter: Duration,
    /// Channel buffer size for completed reports
    pub buffer_size: usize,
    /// Stop after this many cycles; run until shutdown when unset
    pub max_cycles: Option<u64>,
}

impl Default for ScanLoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            jitter: Duration::from_secs(30),
            buffer_size: 16,
            max_cycles: None,
        }
    }
}

pub struct ScanLoop {
    orchestrator: Arc<ScanOrchestrator>,
    config: ScanLoopConfig,
    reports_tx: mpsc::Sender<Arc<ScanReport>>,
}

impl ScanLoop {
    pub fn new(
        orchestrator: Arc<ScanOrchestrator>,
        config: ScanLoopConfig,
    ) -> (Self, mpsc::Receiver<Arc<ScanReport>>) {
        let (reports_tx, reports_rx) = mpsc::channel(config.buffer_size.max(1));
        (
            Self {
                orchestrator,
                config,
                reports_tx,
            },
            reports_rx,
        )
    }

    /// Run until `shutdown` fires, `max_cycles` is reached, or the report
    /// receiver is dropped. A shutdown during a cycle cancels that cycle.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            jitter_secs = self.config.jitter.as_secs(),
            "Starting scan loop"
        );

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                cancel.cancel();
            })
        };

        let mut delay = Duration::ZERO;
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => break,
            }

            let report = Arc::new(self.orchestrator.run_cycle(&cancel).await);
            cycles += 1;
            let cancelled = report.is_cancelled();

            if self.reports_tx.send(report).await.is_err() {
                warn!("Report receiver dropped, stopping scan loop");
                break;
            }
            if cancelled {
                break;
            }
            if self.config.max_cycles.map(|max| cycles >= max).unwrap_or(false) {
                debug!(cycles = cycles, "Reached cycle limit");
                break;
            }

            delay = self.next_delay();
        }

        watcher.abort();
        info!(cycles = cycles, "Scan loop stopped");
    }

    fn next_delay(&self) -> Duration {
        self.config.interval + Duration::from_millis(rand_jitter(self.config.jitter.as_millis() as u64))
    }
}

/// Pseudo-random jitter in `[0, max_ms)`
fn rand_jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    now % max_ms
}

pub struct ScanLoopBuilder {
    orchestrator: Option<Arc<ScanOrchestrator>>,
    config: ScanLoopConfig,
}

impl ScanLoopBuilder {
    pub fn new() -> Self {
        Self {
            orchestrator: None,
            config: ScanLoopConfig::default(),
        }
    }

    pub fn orchestrator(mut self, orchestrator: Arc<ScanOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.config.max_cycles = Some(cycles);
        self
    }

    pub fn build(self) -> Result<(ScanLoop, mpsc::Receiver<Arc<ScanReport>>)> {
        let orchestrator = self
            .orchestrator
            .ok_or_else(|| anyhow::anyhow!("Orchestrator is required"))?;

        Ok(ScanLoop::new(orchestrator, self.config))
    }
}

impl Default for ScanLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_loop_config_default() {
        let config = ScanLoopConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3600));
        assert_eq!(config.jitter, Duration::from_secs(30));
        assert!(config.max_cycles.is_none());
    }

    #[test]
    fn test_rand_jitter() {
        assert!(rand_jitter(1000) < 1000);
        assert_eq!(rand_jitter(0), 0);
    }

    #[test]
    fn test_builder_requires_orchestrator() {
        assert!(ScanLoopBuilder::new().interval(Duration::from_secs(5)).build().is_err());
    }
}
