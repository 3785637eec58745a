//! Durable history store backed by a JSON-lines file
//!
//! Every append writes one complete line and syncs it before the sample is
//! made visible in memory. On open, existing lines are replayed; a line that
//! fails to parse (e.g. a torn final write) is skipped and counted.

use super::{HistoryPage, InMemoryHistoryStore, MetricsHistoryStore};
use crate::error::{FleetError, FleetResult};
use crate::models::{MetricKind, MetricSample};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// History store that persists every sample to an append-only file
#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
    file: Mutex<File>,
    index: InMemoryHistoryStore,
    skipped_lines: usize,
}

impl JsonlHistoryStore {
    /// Open (or create) the store at `path`, replaying existing samples
    pub fn open(path: impl AsRef<Path>) -> FleetResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FleetError::HistoryStore(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let index = InMemoryHistoryStore::new();
        let mut skipped_lines = 0;

        if path.exists() {
            let reader = File::open(&path)
                .map(BufReader::new)
                .map_err(|e| FleetError::HistoryStore(format!("open {}: {}", path.display(), e)))?;

            for (line_no, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| {
                    FleetError::HistoryStore(format!("read {}: {}", path.display(), e))
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<MetricSample>(&line) {
                    Ok(sample) => index.append(sample)?,
                    Err(e) => {
                        skipped_lines += 1;
                        warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "Skipping unreadable history line"
                        );
                    }
                }
            }

            info!(
                path = %path.display(),
                samples = index.sample_count(),
                skipped = skipped_lines,
                "Loaded metrics history"
            );
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FleetError::HistoryStore(format!("open {}: {}", path.display(), e)))?;

        // Terminate a torn final line so the next append starts clean
        if !ends_with_newline(&path)? {
            file.write_all(b"\n")
                .map_err(|e| FleetError::HistoryStore(format!("repair {}: {}", path.display(), e)))?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            index,
            skipped_lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines skipped as unreadable when the store was opened
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

fn ends_with_newline(path: &Path) -> FleetResult<bool> {
    let mut file = File::open(path)
        .map_err(|e| FleetError::HistoryStore(format!("open {}: {}", path.display(), e)))?;
    let len = file
        .metadata()
        .map_err(|e| FleetError::HistoryStore(format!("stat {}: {}", path.display(), e)))?
        .len();
    if len == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| FleetError::HistoryStore(format!("read {}: {}", path.display(), e)))?;
    Ok(last[0] == b'\n')
}

impl MetricsHistoryStore for JsonlHistoryStore {
    fn append(&self, sample: MetricSample) -> FleetResult<()> {
        let mut line = serde_json::to_vec(&sample)
            .map_err(|e| FleetError::HistoryStore(format!("serialize sample: {}", e)))?;
        line.push(b'\n');

        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| FleetError::HistoryStore("history file lock poisoned".to_string()))?;
            file.write_all(&line)
                .and_then(|_| file.sync_data())
                .map_err(|e| {
                    FleetError::HistoryStore(format!("append {}: {}", self.path.display(), e))
                })?;
        }

        self.index.append(sample)
    }

    fn history(&self, resource_id: &str, kind: MetricKind) -> Vec<MetricSample> {
        self.index.history(resource_id, kind)
    }

    fn series_len(&self, resource_id: &str, kind: MetricKind) -> usize {
        self.index.series_len(resource_id, kind)
    }

    fn window(
        &self,
        resource_id: &str,
        kind: MetricKind,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<MetricSample> {
        self.index.window(resource_id, kind, since, until)
    }

    fn history_page(
        &self,
        resource_id: &str,
        kind: MetricKind,
        offset: usize,
        limit: usize,
    ) -> HistoryPage {
        self.index.history_page(resource_id, kind, offset, limit)
    }
}
