//! JSON-lines persistence store
//!
//! Resource snapshots and cost records go to two append-only files in one
//! directory. Each record is serialized in full, then written as a single
//! line and synced, so a retried append can duplicate a row but never leave
//! half of one.

use super::sources::PersistenceStore;
use crate::models::{ResourceCostRecord, ResourceSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

const SNAPSHOTS_FILE: &str = "resource_snapshots.jsonl";
const COST_RECORDS_FILE: &str = "cost_records.jsonl";

#[derive(Debug)]
pub struct JsonlPersistenceStore {
    dir: PathBuf,
    /// Serializes appends so lines from concurrent tasks never interleave
    write_lock: Mutex<()>,
}

impl JsonlPersistenceStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create persistence directory {:?}", dir))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn snapshots_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOTS_FILE)
    }

    pub fn cost_records_path(&self) -> PathBuf {
        self.dir.join(COST_RECORDS_FILE)
    }

    async fn append_line<T: Serialize>(&self, path: PathBuf, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record).context("Failed to serialize record")?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {:?}", path))?;
        file.write_all(&line)
            .await
            .with_context(|| format!("Failed to append to {:?}", path))?;
        file.sync_data()
            .await
            .with_context(|| format!("Failed to sync {:?}", path))?;
        Ok(())
    }

    /// Every readable cost record, oldest first
    pub async fn read_cost_records(&self) -> Result<Vec<ResourceCostRecord>> {
        read_lines(&self.cost_records_path()).await
    }

    pub async fn read_snapshots(&self) -> Result<Vec<ResourceSnapshot>> {
        read_lines(&self.snapshots_path()).await
    }
}

async fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                path = ?path,
                line = line_no + 1,
                error = %e,
                "Skipping unreadable record"
            ),
        }
    }
    Ok(records)
}

#[async_trait]
impl PersistenceStore for JsonlPersistenceStore {
    async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> Result<()> {
        self.append_line(self.snapshots_path(), snapshot).await
    }

    async fn append_cost_record(&self, record: &ResourceCostRecord) -> Result<()> {
        self.append_line(self.cost_records_path(), record).await
    }
}
