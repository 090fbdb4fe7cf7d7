//! Sync command implementation.
//!
//! Exit codes: `3` when offline, `2` without a configured endpoint, `1`
//! when any record failed.

use std::sync::Arc;

use crate::cli::args::SyncArgs;
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::sync::{SyncOrchestrator, SyncResult, SyncTransport};
use crate::ui::UserInterface;

use super::dispatcher::{exit_code, Command, CommandResult};
use super::display::print_json;

pub struct SyncCommand {
    workspace: Workspace,
    args: SyncArgs,
}

impl SyncCommand {
    pub fn new(workspace: Workspace, args: SyncArgs) -> Self {
        Self { workspace, args }
    }

    fn report(&self, ui: &mut dyn UserInterface, result: &SyncResult) -> Result<CommandResult> {
        if self.args.json {
            print_json(ui, result)?;
        } else {
            for error in &result.errors {
                ui.warning(error);
            }
            if result.failed_total() > 0 {
                ui.hint("Failed records stay pending and are retried on the next sync.");
            }
        }

        if result.success {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(exit_code::FAILURE))
        }
    }
}

fn summary(result: &SyncResult) -> String {
    format!(
        "Synced {} task(s) and {} evidence record(s)",
        result.synced_tasks, result.synced_evidence
    )
}

impl Command for SyncCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if !self.workspace.is_online() {
            ui.error("Cannot sync while offline");
            return Ok(CommandResult::failure(exit_code::OFFLINE));
        }

        let Some(transport) = self.workspace.transport()? else {
            ui.error("No remote endpoint configured");
            ui.hint("Set remote.endpoint in .tasksync/config.yml or TASKSYNC_ENDPOINT.");
            return Ok(CommandResult::failure(exit_code::NOT_CONFIGURED));
        };
        let transport: Arc<dyn SyncTransport> = Arc::new(transport);

        let repos = Arc::new(self.workspace.open_repositories());
        let orchestrator = SyncOrchestrator::new(repos, Arc::clone(&transport), true);

        if self.args.json {
            let result = orchestrator.manual_sync()?;
            return self.report(ui, &result);
        }

        let pending = orchestrator.get_sync_status_data()?.dirty_items();
        let mut spinner = ui.start_spinner(&format!(
            "Syncing {} record(s) to {}",
            pending,
            transport.describe()
        ));

        let result = match orchestrator.manual_sync() {
            Ok(result) => result,
            Err(e) => {
                spinner.finish_error(&e.to_string());
                return Err(e);
            }
        };

        if result.nothing_to_sync {
            spinner.finish_success("Nothing to sync");
        } else if result.success {
            spinner.finish_success(&summary(&result));
        } else {
            spinner.finish_error(&format!(
                "{}; {} failed",
                summary(&result),
                result.failed_total()
            ));
        }

        self.report(ui, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskSyncConfig;
    use crate::records::SyncStatus;
    use crate::repository::NewTask;
    use crate::store::Record;
    use crate::ui::{MockUI, SpinnerStatus};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn workspace(root: &Path, endpoint: Option<String>, online: bool) -> Workspace {
        let mut config = TaskSyncConfig::default();
        config.remote.endpoint = endpoint;
        config.sync.start_online = online;
        Workspace::with_config(root, config)
    }

    fn run(ws: Workspace, json: bool) -> (CommandResult, MockUI) {
        let mut ui = MockUI::new();
        let result = SyncCommand::new(ws, SyncArgs { json })
            .execute(&mut ui)
            .unwrap();
        (result, ui)
    }

    fn seed_task(ws: &Workspace, title: &str) -> String {
        let repos = ws.open_repositories();
        let project = repos.projects.create("Site", "").unwrap();
        repos
            .tasks
            .create(NewTask::new(project.id(), title))
            .unwrap()
            .meta
            .id
    }

    #[test]
    fn offline_exits_3() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(temp.path(), Some("http://localhost:1".to_string()), false);
        let (result, ui) = run(ws, false);
        assert_eq!(result.exit_code, exit_code::OFFLINE);
        assert!(ui.has_error("offline"));
    }

    #[test]
    fn missing_endpoint_exits_2() {
        let temp = TempDir::new().unwrap();
        let (result, ui) = run(workspace(temp.path(), None, true), false);
        assert_eq!(result.exit_code, exit_code::NOT_CONFIGURED);
        assert!(ui.has_hint("remote.endpoint"));
    }

    #[test]
    fn nothing_to_sync_does_not_call_remote() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/sync");
            then.status(200).json_body(json!({ "results": [] }));
        });

        let temp = TempDir::new().unwrap();
        let (result, ui) = run(workspace(temp.path(), Some(server.base_url()), true), false);

        assert!(result.success);
        mock.assert_calls(0);
        assert_eq!(
            ui.spinners()[0].finish_message.as_deref(),
            Some("Nothing to sync")
        );
    }

    #[test]
    fn successful_run_marks_records_synced() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let ws = workspace(temp.path(), Some(server.base_url()), true);
        let id = seed_task(&ws, "Inspect roof");

        let mock = server.mock(|when, then| {
            when.method(POST).path("/sync").body_includes("Inspect roof");
            then.status(200).json_body(json!({
                "results": [{ "kind": "task", "id": id, "success": true }]
            }));
        });

        let (result, ui) = run(ws.clone(), false);

        mock.assert_calls(1);
        assert!(result.success);
        let spinner = &ui.spinners()[0];
        assert_eq!(spinner.status, Some(SpinnerStatus::Success));
        assert_eq!(
            spinner.finish_message.as_deref(),
            Some("Synced 1 task(s) and 0 evidence record(s)")
        );

        let task = ws.open_repositories().tasks.require(&id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Synced);
        assert!(!task.sync.needs_sync);
    }

    #[test]
    fn rejected_record_exits_1_and_stays_dirty() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let ws = workspace(temp.path(), Some(server.base_url()), true);
        let id = seed_task(&ws, "Bad task");

        server.mock(|when, then| {
            when.method(POST).path("/sync");
            then.status(200).json_body(json!({
                "results": [{ "kind": "task", "id": id, "success": false, "message": "title taken" }]
            }));
        });

        let (result, ui) = run(ws.clone(), true);

        assert_eq!(result.exit_code, exit_code::FAILURE);
        assert!(ui.spinners().is_empty());
        let parsed: serde_json::Value = serde_json::from_str(&ui.raw_output()).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["failedTasks"], 1);

        let task = ws.open_repositories().tasks.require(&id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Failed);
        assert_eq!(task.sync.sync_error.as_deref(), Some("title taken"));
    }

    #[test]
    fn server_error_fails_every_record() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let ws = workspace(temp.path(), Some(server.base_url()), true);
        let id = seed_task(&ws, "Anything");

        server.mock(|when, then| {
            when.method(POST).path("/sync");
            then.status(503);
        });

        let (result, ui) = run(ws.clone(), false);

        assert_eq!(result.exit_code, exit_code::FAILURE);
        assert!(ui.has_warning("503"));
        assert!(ui.has_hint("retried"));
        let task = ws.open_repositories().tasks.require(&id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Failed);
    }
}
