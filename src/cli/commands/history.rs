//! History command implementation.
//!
//! The `tasksync history` command shows recent sync runs, most recent first.

use chrono::Utc;

use crate::cli::args::HistoryArgs;
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::repository::SyncRunRecord;
use crate::ui::{format_duration_ms, format_relative_time, Table, TaskSyncTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::print_json;

/// The history command implementation.
pub struct HistoryCommand {
    workspace: Workspace,
    args: HistoryArgs,
}

impl HistoryCommand {
    pub fn new(workspace: Workspace, args: HistoryArgs) -> Self {
        Self { workspace, args }
    }

    fn result_cell(theme: &TaskSyncTheme, run: &SyncRunRecord) -> String {
        if run.success {
            theme.success.apply_to("ok").to_string()
        } else if run.synced_tasks + run.synced_evidence > 0 {
            theme.warning.apply_to("partial").to_string()
        } else {
            theme.error.apply_to("failed").to_string()
        }
    }
}

impl Command for HistoryCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let repos = self.workspace.open_repositories();
        let runs = repos.queue.history(self.args.limit)?;

        if self.args.json {
            print_json(ui, &runs)?;
            return Ok(CommandResult::success());
        }

        if runs.is_empty() {
            ui.message("No sync runs yet.");
            return Ok(CommandResult::success());
        }

        let now = Utc::now();
        let theme = ui.theme();
        let mut table = Table::new(["When", "Trigger", "Duration", "Synced", "Failed", "Result"]);
        for run in &runs {
            table.add_row([
                format_relative_time(run.started_at, now),
                run.trigger.to_string(),
                format_duration_ms(run.duration_ms),
                (run.synced_tasks + run.synced_evidence).to_string(),
                (run.failed_tasks + run.failed_evidence).to_string(),
                Self::result_cell(&theme, run),
            ]);
        }
        ui.show_table(&table);

        if ui.output_mode().shows_detail() {
            for run in runs.iter().filter(|r| !r.errors.is_empty()) {
                ui.message("");
                ui.message(&format!("{}:", run.started_at.format("%Y-%m-%d %H:%M:%S")));
                for error in &run.errors {
                    ui.message(&format!("  {}", error));
                }
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskSyncConfig;
    use crate::repository::SyncTrigger;
    use crate::ui::{MockUI, OutputMode};
    use tempfile::TempDir;

    fn record(ws: &Workspace, synced: usize, failed: usize, errors: &[&str]) {
        ws.open_repositories()
            .queue
            .record_run(
                Utc::now(),
                SyncRunRecord {
                    started_at: Utc::now(),
                    duration_ms: 1500,
                    trigger: SyncTrigger::Manual,
                    success: failed == 0,
                    synced_tasks: synced,
                    synced_evidence: 0,
                    failed_tasks: failed,
                    failed_evidence: 0,
                    errors: errors.iter().map(|e| e.to_string()).collect(),
                },
            )
            .unwrap();
    }

    fn run(ws: &Workspace, ui: &mut MockUI, limit: usize, json: bool) {
        let result = HistoryCommand::new(ws.clone(), HistoryArgs { limit, json })
            .execute(ui)
            .unwrap();
        assert!(result.success);
    }

    #[test]
    fn empty_history() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::with_config(temp.path(), TaskSyncConfig::default());
        let mut ui = MockUI::new();
        run(&ws, &mut ui, 10, false);
        assert!(ui.has_message("No sync runs yet."));
    }

    #[test]
    fn table_shows_results() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::with_config(temp.path(), TaskSyncConfig::default());
        record(&ws, 2, 0, &[]);
        record(&ws, 1, 1, &["task x: rejected"]);

        let mut ui = MockUI::new();
        run(&ws, &mut ui, 10, false);
        assert!(ui.has_message("manual"));
        assert!(ui.has_message("1.5s"));
        assert!(ui.has_message("partial"));
        assert!(ui.has_message("ok"));
        assert!(!ui.has_message("task x: rejected"));
    }

    #[test]
    fn verbose_lists_errors() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::with_config(temp.path(), TaskSyncConfig::default());
        record(&ws, 0, 1, &["HTTP 500"]);

        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        run(&ws, &mut ui, 10, false);
        assert!(ui.has_message("failed"));
        assert!(ui.has_message("  HTTP 500"));
    }

    #[test]
    fn json_respects_limit() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::with_config(temp.path(), TaskSyncConfig::default());
        record(&ws, 1, 0, &[]);
        record(&ws, 3, 0, &[]);

        let mut ui = MockUI::new();
        run(&ws, &mut ui, 1, true);
        let parsed: serde_json::Value = serde_json::from_str(&ui.raw_output()).unwrap();
        let runs = parsed.as_array().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["syncedTasks"], 3);
    }
}
