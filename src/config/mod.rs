//! Configuration loading, parsing, and validation for tasksync.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Environment overrides in [`env_overrides`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use tasksync::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".tasksync");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "remote:\n  batch_size: 10\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.remote.batch_size, 10);
//! ```

pub mod env_overrides;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use env_overrides::{apply_env_overrides, apply_process_env};
pub use loader::{
    config_dir, config_file, find_workspace_root, load_config, load_config_value,
    load_merged_config, parse_config, ConfigPaths, CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{RemoteConfig, StorageConfig, SyncSettings, TaskSyncConfig};
pub use validator::{validate, validate_config, ValidationError};
