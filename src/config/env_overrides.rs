//! Environment variable overrides, applied after the file layers.
//!
//! | Variable | Effect |
//! | --- | --- |
//! | `TASKSYNC_ENDPOINT` | replaces `remote.endpoint` |
//! | `TASKSYNC_DATA_DIR` | replaces `storage.data_dir` |
//! | `TASKSYNC_OFFLINE` | truthy (`1`, `true`, `yes`) starts offline |

use std::path::PathBuf;

use crate::config::schema::TaskSyncConfig;

pub const ENDPOINT_VAR: &str = "TASKSYNC_ENDPOINT";
pub const DATA_DIR_VAR: &str = "TASKSYNC_DATA_DIR";
pub const OFFLINE_VAR: &str = "TASKSYNC_OFFLINE";

/// Apply overrides read through `lookup`. Empty values are ignored.
pub fn apply_env_overrides(config: &mut TaskSyncConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(endpoint) = get(ENDPOINT_VAR) {
        tracing::debug!("{} overrides remote.endpoint", ENDPOINT_VAR);
        config.remote.endpoint = Some(endpoint);
    }

    if let Some(dir) = get(DATA_DIR_VAR) {
        tracing::debug!("{} overrides storage.data_dir", DATA_DIR_VAR);
        config.storage.data_dir = PathBuf::from(dir);
    }

    if let Some(offline) = get(OFFLINE_VAR) {
        config.sync.start_online = !is_truthy(&offline);
    }
}

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut TaskSyncConfig) {
    apply_env_overrides(config, |name| std::env::var(name).ok());
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
