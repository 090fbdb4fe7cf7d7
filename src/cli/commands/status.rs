//! Status command implementation.
//!
//! The `tasksync status` command shows the local sync state: counts per
//! sync status, the last successful run, and the records waiting to sync.

use crate::cli::args::StatusArgs;
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::store::Record;
use crate::sync::{SyncStateTracker, SyncStatusData};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::{format_timestamp, print_json, sync_cell};

/// The status command implementation.
pub struct StatusCommand {
    workspace: Workspace,
    args: StatusArgs,
}

impl StatusCommand {
    pub fn new(workspace: Workspace, args: StatusArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let repos = self.workspace.open_repositories();
        let status = SyncStateTracker::new(&repos).snapshot(self.workspace.is_online(), false)?;

        if self.args.json {
            print_json(ui, &status)?;
        } else {
            self.show(ui, &status);
        }
        Ok(CommandResult::success())
    }
}

impl StatusCommand {
    fn show(&self, ui: &mut dyn UserInterface, status: &SyncStatusData) {
        ui.show_header("Sync status");
        ui.message(&format!(
            "Network:   {}",
            if status.is_online { "online" } else { "offline" }
        ));
        ui.message(&format!(
            "Remote:    {}",
            self.workspace
                .config()
                .remote
                .endpoint
                .as_deref()
                .unwrap_or("not configured")
        ));
        ui.message(&format!("Last sync: {}", format_timestamp(status.last_sync_at)));
        ui.message(&format!(
            "Records:   {} total, {} pending, {} synced, {} failed",
            status.total_items, status.pending_items, status.synced_items, status.failed_items
        ));

        let dirty = status.dirty_items();
        if dirty == 0 {
            ui.success("Everything is synced");
            return;
        }

        let theme = ui.theme();
        let mut table = Table::new(["Kind", "ID", "Name", "Sync"]);
        for task in &status.tasks {
            table.add_row([
                "task".to_string(),
                task.id().to_string(),
                task.title.clone(),
                sync_cell(&theme, &task.sync),
            ]);
        }
        for evidence in &status.evidence {
            table.add_row([
                "evidence".to_string(),
                evidence.id().to_string(),
                evidence.file_name.clone(),
                sync_cell(&theme, &evidence.sync),
            ]);
        }
        ui.message("");
        ui.show_table(&table);

        if status.is_online {
            ui.hint(&format!("Run 'tasksync sync' to push {} change(s).", dirty));
        } else {
            ui.hint("Changes will sync once the workspace is back online.");
        }
    }
}
