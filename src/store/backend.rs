//! Storage backends.
//!
//! A backend is a flat key → JSON document medium. The store above it owns
//! the document format; backends only move strings. The backend is chosen
//! once at composition time via [`BackendKind`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Result, TaskSyncError};

/// Durable medium holding one document per key.
pub trait StorageBackend: Send + Sync {
    /// Read the document stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`.
    fn write(&self, key: &str, contents: &str) -> Result<()>;

    /// Human-readable location, for status output.
    fn describe(&self) -> String;
}

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON files under a data directory.
    #[default]
    File,
    /// Process-local memory, lost on exit.
    Memory,
}

/// Open a backend of the given kind rooted at `data_dir`.
pub fn open_backend(kind: BackendKind, data_dir: &Path) -> Arc<dyn StorageBackend> {
    match kind {
        BackendKind::File => Arc::new(FileBackend::new(data_dir)),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    }
}

/// Stores each document as `<root>/<key>.json`.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.document_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TaskSyncError::Io(e)),
        }
    }

    /// Uses write-to-temp-then-rename so a crash mid-write never leaves a
    /// truncated collection behind.
    fn write(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let path = self.document_path(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a consistent map: writes are single inserts.
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.docs().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        self.docs().insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
