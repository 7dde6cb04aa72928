//! JSON-lines backend: one append-only log file per operation id.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};
use waymark_core_types::OperationId;

use crate::api::{rank_latest, CheckpointStore, StoreResult};
use crate::errors::{StoreError, StoreErrorKind};
use crate::metrics;
use crate::model::CheckpointEnvelope;
use crate::naming;

/// Size and mtime of a log file as last seen by this handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

/// Per-id writer state, populated lazily from disk.
///
/// Cached values are only trusted while the file still carries the
/// fingerprint recorded with them; another handle deleting, compacting or
/// appending to the log forces a rescan.
#[derive(Debug, Default)]
struct Slot {
    loaded: bool,
    fingerprint: Option<Fingerprint>,
    last_seq: Option<i64>,
    records: usize,
    torn_tail: bool,
}

pub struct FileCheckpointStore {
    root: PathBuf,
    fsync: bool,
    max_history: usize,
    slots: DashMap<OperationId, Arc<Mutex<Slot>>>,
}

struct Scan {
    latest: Option<CheckpointEnvelope>,
    records: usize,
    torn_tail: bool,
}

impl FileCheckpointStore {
    pub fn open(root: impl AsRef<Path>, fsync: bool, max_history: usize) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            fsync,
            max_history,
            slots: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, operation: &OperationId) -> StoreResult<PathBuf> {
        if operation.as_str().is_empty() {
            return Err(StoreErrorKind::InvalidOperationId("empty".into()).into());
        }
        Ok(self.root.join(naming::file_name(operation.as_str())))
    }

    fn slot(&self, operation: &OperationId) -> Arc<Mutex<Slot>> {
        self.slots
            .entry(operation.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Slot::default())))
            .clone()
    }

    async fn scan(path: PathBuf) -> StoreResult<Scan> {
        task::spawn_blocking(move || scan_file(&path))
            .await
            .map_err(|err| StoreError::new(StoreErrorKind::Internal(err.to_string())))?
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, envelope: CheckpointEnvelope) -> StoreResult<()> {
        let path = self.path_for(&envelope.operation_id)?;
        let slot = self.slot(&envelope.operation_id);
        let mut slot = slot.lock().await;

        let on_disk = fingerprint(&path).await?;
        if !slot.loaded || slot.fingerprint != on_disk {
            if slot.loaded {
                debug!(operation = %envelope.operation_id, "checkpoint log changed on disk, rescanning");
            }
            let scan = Self::scan(path.clone()).await?;
            slot.last_seq = scan.latest.map(|env| env.seq);
            slot.records = scan.records;
            slot.torn_tail = scan.torn_tail;
            slot.loaded = true;
        }
        if let Some(last) = slot.last_seq {
            if envelope.seq <= last {
                metrics::record_save(false);
                return Err(StoreErrorKind::StaleSeq {
                    operation: envelope.operation_id.0.clone(),
                    seq: envelope.seq,
                    last,
                }
                .into());
            }
        }

        let mut line = Vec::new();
        if slot.torn_tail {
            line.push(b'\n');
        }
        line.extend(serde_json::to_vec(&envelope)?);
        line.push(b'\n');
        let fsync = self.fsync;
        let append_path = path.clone();
        let written = task::spawn_blocking(move || append_line(&append_path, &line, fsync))
            .await
            .map_err(|err| StoreError::new(StoreErrorKind::Internal(err.to_string())))?;
        if let Err(err) = written {
            metrics::record_save(false);
            return Err(err.into());
        }
        metrics::record_save(true);
        slot.last_seq = Some(envelope.seq);
        slot.records += 1;
        slot.torn_tail = false;

        if self.max_history > 0 && slot.records > self.max_history.saturating_mul(2) {
            let keep = self.max_history;
            let compact_path = path.clone();
            let kept = task::spawn_blocking(move || compact_file(&compact_path, keep))
                .await
                .map_err(|err| StoreError::new(StoreErrorKind::Internal(err.to_string())))??;
            debug!(
                operation = %envelope.operation_id,
                kept,
                "compacted checkpoint log"
            );
            metrics::record_compaction();
            slot.records = kept;
        }
        slot.fingerprint = fingerprint(&path).await?;
        Ok(())
    }

    async fn load_latest(
        &self,
        operation: &OperationId,
    ) -> StoreResult<Option<CheckpointEnvelope>> {
        metrics::record_load();
        let path = self.path_for(operation)?;
        Ok(Self::scan(path).await?.latest)
    }

    async fn delete(&self, operation: &OperationId) -> StoreResult<()> {
        let path = self.path_for(operation)?;
        let slot = self.slot(operation);
        let mut slot = slot.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *slot = Slot {
            loaded: true,
            ..Slot::default()
        };
        Ok(())
    }

    async fn list_latest(
        &self,
        prefix: &str,
        top_n: usize,
    ) -> StoreResult<Vec<CheckpointEnvelope>> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        let latest = task::spawn_blocking(move || -> StoreResult<Vec<CheckpointEnvelope>> {
            let mut latest = Vec::new();
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                let name = entry.file_name();
                let Some(operation) = name.to_str().and_then(naming::operation_from_file_name)
                else {
                    continue;
                };
                if !operation.starts_with(&prefix) {
                    continue;
                }
                if let Some(env) = scan_file(&entry.path())?.latest {
                    latest.push(env);
                }
            }
            Ok(latest)
        })
        .await
        .map_err(|err| StoreError::new(StoreErrorKind::Internal(err.to_string())))??;
        Ok(rank_latest(latest, top_n))
    }
}

async fn fingerprint(path: &Path) -> StoreResult<Option<Fingerprint>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(Fingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
        })),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn append_line(path: &Path, line: &[u8], fsync: bool) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line)?;
    if fsync {
        file.sync_data()?;
    }
    Ok(())
}

fn scan_file(path: &Path) -> StoreResult<Scan> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(Scan {
                latest: None,
                records: 0,
                torn_tail: false,
            })
        }
        Err(err) => return Err(err.into()),
    };
    let mut latest: Option<CheckpointEnvelope> = None;
    let mut records = 0;
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CheckpointEnvelope>(line) {
            Ok(env) => {
                records += 1;
                if latest.as_ref().map_or(true, |cur| env.seq > cur.seq) {
                    latest = Some(env);
                }
            }
            // A torn tail from a killed writer is expected; anything else is noise.
            Err(err) => warn!(
                path = %path.display(),
                line = idx + 1,
                %err,
                "skipping unreadable checkpoint record"
            ),
        }
    }
    let torn_tail = !content.is_empty() && !content.ends_with('\n');
    Ok(Scan {
        latest,
        records,
        torn_tail,
    })
}

/// Rewrite the log keeping the newest `keep` records, via temp file + rename.
fn compact_file(path: &Path, keep: usize) -> StoreResult<usize> {
    let content = fs::read_to_string(path)?;
    let mut records: Vec<CheckpointEnvelope> = content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    records.sort_by_key(|env| env.seq);
    let start = records.len().saturating_sub(keep);
    let retained = &records[start..];

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("log"),
        uuid::Uuid::new_v4()
    );
    let temp_path = path.with_file_name(temp_name);
    {
        let mut file = File::create(&temp_path)?;
        for env in retained {
            let mut line = serde_json::to_vec(env)?;
            line.push(b'\n');
            file.write_all(&line)?;
        }
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(retained.len())
}
