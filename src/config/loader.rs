//! Configuration file discovery and loading.
//!
//! Layers, later overriding earlier:
//! 1. Built-in defaults
//! 2. Workspace config (`.tasksync/config.yml`)
//! 3. Local overrides (`.tasksync/config.local.yml`)
//! 4. Environment variables (see [`env_overrides`](super::env_overrides))

use crate::config::env_overrides::apply_process_env;
use crate::config::merger::merge_configs;
use crate::config::schema::TaskSyncConfig;
use crate::config::validator::validate;
use crate::error::{Result, TaskSyncError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-workspace directory.
pub const CONFIG_DIR: &str = ".tasksync";

/// Paths to configuration files in priority order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Workspace config: .tasksync/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .tasksync/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given workspace root.
    pub fn discover(workspace_root: &Path) -> Self {
        Self {
            project: existing(config_file(workspace_root)),
            project_local: existing(config_dir(workspace_root).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    /// Check if a workspace config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// `<root>/.tasksync`
pub fn config_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_DIR)
}

/// `<root>/.tasksync/config.yml`
pub fn config_file(workspace_root: &Path) -> PathBuf {
    config_dir(workspace_root).join("config.yml")
}

/// Find the workspace root by walking up from `start`.
///
/// The root is the nearest directory containing `.tasksync/`.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if config_dir(&current).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Parse YAML content into TaskSyncConfig.
pub fn parse_config(content: &str, source_path: &Path) -> Result<TaskSyncConfig> {
    serde_yaml::from_str(content).map_err(|e| TaskSyncError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as raw YAML Value (for merging).
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TaskSyncError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TaskSyncError::Io(e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| TaskSyncError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge the config files of a workspace.
///
/// Missing files are not an error; the result is the defaults overlaid
/// with whatever exists. Environment overrides are not applied.
pub fn load_merged_config(workspace_root: &Path) -> Result<TaskSyncConfig> {
    let paths = ConfigPaths::discover(workspace_root);

    let mut layers = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config layer {}", path.display());
        layers.push(load_config_value(path)?);
    }

    let merged = merge_configs(&layers);
    serde_yaml::from_value(merged).map_err(|e| TaskSyncError::ConfigParseError {
        path: config_file(workspace_root),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load the effective configuration: files, then environment, then validation.
pub fn load_config(workspace_root: &Path) -> Result<TaskSyncConfig> {
    let mut config = load_merged_config(workspace_root)?;
    apply_process_env(&mut config);
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BackendKind;
    use tempfile::TempDir;

    fn write_config(root: &Path, name: &str, content: &str) {
        let dir = config_dir(root);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discover_finds_both_layers() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "");
        write_config(temp.path(), "config.local.yml", "");

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.has_project_config());
        assert!(paths.project_local.is_some());
        assert_eq!(paths.all_existing().len(), 2);
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover(temp.path());
        assert!(!paths.has_project_config());
        assert!(paths.all_existing().is_empty());
    }

    #[test]
    fn missing_files_give_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config, TaskSyncConfig::default());
    }

    #[test]
    fn local_layer_overrides_project_layer() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "config.yml",
            "remote:\n  endpoint: https://prod.example.com\n  batch_size: 25\n",
        );
        write_config(
            temp.path(),
            "config.local.yml",
            "remote:\n  endpoint: http://localhost:8080\nstorage:\n  backend: memory\n",
        );

        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(
            config.remote.endpoint.as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(config.remote.batch_size, 25);
        assert_eq!(config.storage.backend, BackendKind::Memory);
    }

    #[test]
    fn empty_project_file_is_allowed() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "");
        assert!(load_merged_config(temp.path()).is_ok());
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "remote: [unclosed");

        let err = load_merged_config(temp.path()).unwrap_err();
        match err {
            TaskSyncError::ConfigParseError { path, .. } => {
                assert!(path.ends_with("config.yml"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "remote:\n  batch_size: lots\n");
        assert!(matches!(
            load_merged_config(temp.path()).unwrap_err(),
            TaskSyncError::ConfigParseError { .. }
        ));
    }

    #[test]
    fn load_config_file_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_config_value(&temp.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, TaskSyncError::ConfigNotFound { .. }));
    }

    #[test]
    fn find_workspace_root_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(config_dir(temp.path())).unwrap();

        assert_eq!(
            find_workspace_root(&nested),
            Some(temp.path().to_path_buf())
        );
    }

    #[test]
    fn parse_config_reports_source() {
        let err = parse_config("sync: [", Path::new("inline.yml")).unwrap_err();
        assert!(err.to_string().contains("inline.yml"));
    }
}
