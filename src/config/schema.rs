//! Configuration schema definitions for tasksync.
//!
//! This module contains the struct definitions that map to the
//! `.tasksync/config.yml` file format. Every section and field is optional;
//! missing values take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::BackendKind;

/// Root configuration structure for `.tasksync/config.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSyncConfig {
    /// Local persistence
    pub storage: StorageConfig,

    /// Remote system of record
    pub remote: RemoteConfig,

    /// Orchestration behavior
    pub sync: SyncSettings,
}

impl TaskSyncConfig {
    /// Commented config written by `tasksync init`.
    pub const TEMPLATE: &'static str = r#"# tasksync configuration
#
# Values in config.local.yml (same directory) override this file.

storage:
  # file | memory
  backend: file
  data_dir: .tasksync/data

remote:
  # Base URL of the sync endpoint; records are POSTed to <endpoint>/sync
  # endpoint: https://sync.example.com/api
  timeout_secs: 30
  batch_size: 100
  # Name of an environment variable holding a bearer token
  # auth_token_env: TASKSYNC_TOKEN

sync:
  auto_sync_on_reconnect: true
  start_online: true
  history_retention: 20
"#;
}

/// Where and how records are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend
    pub backend: BackendKind,

    /// Data directory, relative to the workspace root unless absolute
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// The data directory resolved against `workspace_root`.
    pub fn resolve_data_dir(&self, workspace_root: &Path) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            workspace_root.join(&self.data_dir)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".tasksync").join("data")
}

/// Remote sync endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL; sync is unavailable when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum records per HTTP request
    pub batch_size: usize,

    /// Environment variable holding a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token_env: Option<String>,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The bearer token, if a token variable is configured and set.
    pub fn auth_token(&self) -> Option<String> {
        let var = self.auth_token_env.as_deref()?;
        std::env::var(var).ok().filter(|t| !t.is_empty())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            auth_token_env: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    100
}

/// Orchestration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Run automatically on an offline-to-online transition
    pub auto_sync_on_reconnect: bool,

    /// Initial connectivity assumed by the CLI
    pub start_online: bool,

    /// Number of run records kept in history
    pub history_retention: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync_on_reconnect: true,
            start_online: true,
            history_retention: default_history_retention(),
        }
    }
}

fn default_history_retention() -> usize {
    20
}
