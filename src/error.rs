//! Error types for tasksync operations.
//!
//! This module defines [`TaskSyncError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Storage errors (`Validation`, `NotFound`, `Storage`) are local and are
//!   returned as typed results, never panics
//! - `Transport` errors are retryable; the orchestrator records them on the
//!   affected records instead of propagating them
//! - Use `anyhow::Error` (via `TaskSyncError::Other`) inside leaf adapters

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tasksync operations.
#[derive(Debug, Error)]
pub enum TaskSyncError {
    /// An item was rejected by a validation hook before persistence.
    #[error("Invalid {collection} record: {message}")]
    Validation { collection: String, message: String },

    /// A mutate or delete targeted an ID that does not exist.
    #[error("No {collection} record with id '{id}'")]
    NotFound { collection: String, id: String },

    /// The remote sync transport failed for a record or a whole batch.
    #[error("Sync transport failed: {message}")]
    Transport { message: String },

    /// A sync run was requested while offline.
    #[error("Cannot sync while offline")]
    Offline,

    /// A sync run was requested while another run is still in flight.
    #[error("A sync run is already in progress")]
    SyncInProgress,

    /// A persisted document could not be read or written.
    #[error("Storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskSyncError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether the error was raised locally and needs caller action.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

/// Result type alias for tasksync operations.
pub type Result<T> = std::result::Result<T, TaskSyncError>;
