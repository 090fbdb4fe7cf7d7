//! The workspace a command runs against: root directory plus effective config.

use std::path::{Path, PathBuf};

use crate::config::{load_config, TaskSyncConfig};
use crate::error::{Result, TaskSyncError};
use crate::repository::Repositories;
use crate::sync::HttpTransport;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: TaskSyncConfig,
}

impl Workspace {
    /// Load the effective configuration for `root`.
    ///
    /// `offline` forces the initial connectivity to offline regardless of config.
    pub fn load(root: &Path, offline: bool) -> Result<Self> {
        let mut config = load_config(root)?;
        if offline {
            config.sync.start_online = false;
        }
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: TaskSyncConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TaskSyncConfig {
        &self.config
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config.storage.resolve_data_dir(&self.root)
    }

    pub fn is_online(&self) -> bool {
        self.config.sync.start_online
    }

    pub fn open_repositories(&self) -> Repositories {
        Repositories::open(
            self.config.storage.backend,
            &self.data_dir(),
            self.config.sync.history_retention,
        )
    }

    /// The HTTP transport for the configured endpoint, if there is one.
    pub fn transport(&self) -> Result<Option<HttpTransport>> {
        let remote = &self.config.remote;
        let Some(endpoint) = remote.endpoint.as_deref() else {
            return Ok(None);
        };

        let mut transport = HttpTransport::new(endpoint, remote.timeout())
            .map_err(TaskSyncError::Other)?
            .with_batch_size(remote.batch_size);
        if let Some(token) = remote.auth_token() {
            transport = transport.with_auth_token(token);
        }
        Ok(Some(transport))
    }
}
