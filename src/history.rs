//! Bounded snapshot history and its on-disk persistence.

use crate::error::PersistenceError;
use crate::metrics::MetricsSnapshot;
use chrono::Utc;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Most recent snapshots, oldest evicted first once `capacity` is exceeded.
#[derive(Debug)]
pub struct MetricsHistory {
    entries: VecDeque<MetricsSnapshot>,
    capacity: usize,
    save_every: u64,
    pushed: u64,
}

impl MetricsHistory {
    pub fn new(capacity: usize, save_every: u64) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            save_every: save_every.max(1),
            pushed: 0,
        }
    }

    /// Append a snapshot. Returns true when this push lands on a save
    /// boundary (every `save_every` pushes since startup, regardless of
    /// eviction).
    pub fn push(&mut self, snapshot: MetricsSnapshot) -> bool {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
        self.pushed += 1;
        self.pushed % self.save_every == 0
    }

    pub fn entries(&self) -> &VecDeque<MetricsSnapshot> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pushes since creation
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }
}

/// Durable sink for the history.
pub trait PersistenceStore: Send {
    /// Write the full history, returning where it went.
    fn save(&mut self, history: &VecDeque<MetricsSnapshot>) -> Result<PathBuf, PersistenceError>;
}

/// Writes history as a pretty JSON array to `metrics_YYYYMMDD.json`.
///
/// One file per UTC day; each save overwrites that day's file with the
/// current in-memory history.
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for_today(&self) -> PathBuf {
        self.dir
            .join(format!("metrics_{}.json", Utc::now().format("%Y%m%d")))
    }
}

impl PersistenceStore for JsonHistoryStore {
    fn save(&mut self, history: &VecDeque<MetricsSnapshot>) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for_today();
        let io_err = |source| PersistenceError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(io_err)?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, history)?;
        writer.flush().map_err(io_err)?;

        Ok(path)
    }
}
