//! Aggregate sync-queue document.
//!
//! Holds `lastSyncAt` and the recent run history. The dirty working set is
//! never stored here: it is always recomputed by scanning the records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{Result, TaskSyncError};
use crate::store::StorageBackend;

pub const KEY: &str = "sync_queue";

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    Manual,
    Reconnect,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Reconnect => f.write_str("reconnect"),
        }
    }
}

/// A record of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunRecord {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Wall time of the run in milliseconds.
    pub duration_ms: u64,

    pub trigger: SyncTrigger,

    /// True only when every submitted record succeeded.
    pub success: bool,

    pub synced_tasks: usize,
    pub synced_evidence: usize,
    pub failed_tasks: usize,
    pub failed_evidence: usize,

    #[serde(default)]
    pub errors: Vec<String>,
}

/// Persisted aggregate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueState {
    /// Schema version for migration.
    pub version: u32,

    /// When the last run that had work finished.
    pub last_sync_at: Option<DateTime<Utc>>,

    /// Run history (most recent first).
    #[serde(default)]
    pub runs: Vec<SyncRunRecord>,
}

impl SyncQueueState {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Default number of runs to keep.
    pub const DEFAULT_HISTORY_RETENTION: usize = 20;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            last_sync_at: None,
            runs: Vec::new(),
        }
    }

    /// Get run history (most recent first).
    pub fn run_history(&self, limit: usize) -> &[SyncRunRecord] {
        let len = self.runs.len().min(limit);
        &self.runs[..len]
    }

    fn record_run(&mut self, finished_at: DateTime<Utc>, record: SyncRunRecord, keep: usize) {
        self.last_sync_at = Some(finished_at);
        self.runs.insert(0, record);
        self.runs.truncate(keep);
    }
}

impl Default for SyncQueueState {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and writes the [`SyncQueueState`] document.
pub struct SyncQueueStore {
    backend: Arc<dyn StorageBackend>,
    retention: usize,
    write_lock: Mutex<()>,
}

impl SyncQueueStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_retention(backend, SyncQueueState::DEFAULT_HISTORY_RETENTION)
    }

    pub fn with_retention(backend: Arc<dyn StorageBackend>, retention: usize) -> Self {
        Self {
            backend,
            retention,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the state, or a fresh one when nothing has been stored yet.
    pub fn load(&self) -> Result<SyncQueueState> {
        let Some(raw) = self.backend.read(KEY)? else {
            return Ok(SyncQueueState::new());
        };

        let state: SyncQueueState =
            serde_json::from_str(&raw).map_err(|e| TaskSyncError::Storage {
                key: KEY.to_string(),
                message: format!("corrupt sync queue document: {}", e),
            })?;

        if state.version > SyncQueueState::CURRENT_VERSION {
            return Err(TaskSyncError::Storage {
                key: KEY.to_string(),
                message: format!(
                    "unsupported schema version {} (this build reads up to {})",
                    state.version,
                    SyncQueueState::CURRENT_VERSION
                ),
            });
        }

        Ok(state)
    }

    pub fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load()?.last_sync_at)
    }

    /// Recent runs, most recent first.
    pub fn history(&self, limit: usize) -> Result<Vec<SyncRunRecord>> {
        Ok(self.load()?.run_history(limit).to_vec())
    }

    /// Stamp `lastSyncAt` and prepend `record` to the pruned history.
    pub fn record_run(&self, finished_at: DateTime<Utc>, record: SyncRunRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.load()?;
        state.record_run(finished_at, record, self.retention);
        self.save(&state)
    }

    fn save(&self, state: &SyncQueueState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).map_err(|e| TaskSyncError::Storage {
            key: KEY.to_string(),
            message: format!("failed to serialize sync queue: {}", e),
        })?;
        self.backend.write(KEY, &json)
    }
}
