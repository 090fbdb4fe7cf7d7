//! Init command implementation.
//!
//! The `tasksync init` command creates `.tasksync/` with a starter config.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::args::InitArgs;
use crate::config::{config_dir, config_file, TaskSyncConfig};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{exit_code, Command, CommandResult};

/// Keeps local overrides and record data out of version control.
const GITIGNORE: &str = "config.local.yml\ndata/\n";

const ENDPOINT_PLACEHOLDER: &str = "  # endpoint: https://sync.example.com/api";

/// The init command implementation.
pub struct InitCommand {
    workspace_root: PathBuf,
    args: InitArgs,
}

impl InitCommand {
    pub fn new(workspace_root: &Path, args: InitArgs) -> Self {
        Self {
            workspace_root: workspace_root.to_path_buf(),
            args,
        }
    }

    fn render_config(&self) -> String {
        match &self.args.endpoint {
            Some(endpoint) => TaskSyncConfig::TEMPLATE.replace(
                ENDPOINT_PLACEHOLDER,
                &format!("  endpoint: {}", endpoint),
            ),
            None => TaskSyncConfig::TEMPLATE.to_string(),
        }
    }
}

impl Command for InitCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = config_file(&self.workspace_root);
        if path.exists() && !self.args.force {
            ui.error(&format!("{} already exists", path.display()));
            ui.hint("Use --force to overwrite it.");
            return Ok(CommandResult::failure(exit_code::FAILURE));
        }

        let dir = config_dir(&self.workspace_root);
        fs::create_dir_all(&dir)?;
        fs::write(&path, self.render_config())?;
        fs::write(dir.join(".gitignore"), GITIGNORE)?;
        tracing::debug!("Wrote {}", path.display());

        ui.success(&format!("Initialized tasksync in {}", dir.display()));
        if self.args.endpoint.is_none() {
            ui.hint("Set remote.endpoint in .tasksync/config.yml to enable sync.");
        }
        Ok(CommandResult::success())
    }
}
