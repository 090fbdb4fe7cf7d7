//! `tasksync evidence` subcommands.

use crate::cli::args::{EvidenceAddArgs, EvidenceCommand};
use crate::cli::workspace::Workspace;
use crate::error::{Result, TaskSyncError};
use crate::records::{Evidence, EvidenceKind, FileRef};
use crate::repository::Repositories;
use crate::store::{Query, Record, SortOrder};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::{format_bytes, print_json, report_created, sync_cell};

pub struct EvidenceCommandRunner {
    workspace: Workspace,
    command: EvidenceCommand,
}

impl EvidenceCommandRunner {
    pub fn new(workspace: Workspace, command: EvidenceCommand) -> Self {
        Self { workspace, command }
    }

    fn add(
        &self,
        repos: &Repositories,
        args: &EvidenceAddArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        let file = FileRef::from_path(&args.path).map_err(TaskSyncError::Other)?;
        let kind = args
            .kind
            .map(EvidenceKind::from)
            .unwrap_or_else(|| EvidenceKind::from_extension(&args.path));
        let name = match &args.name {
            Some(name) => name.clone(),
            None => args
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let evidence = repos.add_evidence(Evidence::new(&args.task_id, kind, name, file))?;
        report_created(ui, "evidence", &evidence.file_name, evidence.id());
        if ui.output_mode().shows_detail() {
            ui.message(&format!("  {} ({})", evidence.file.uri, kind));
        }
        Ok(())
    }
}

impl Command for EvidenceCommandRunner {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let repos = self.workspace.open_repositories();

        match &self.command {
            EvidenceCommand::Add(args) => self.add(&repos, args, ui)?,
            EvidenceCommand::List { task, json } => {
                let evidence = match task {
                    Some(task_id) => repos.evidence.list_for_task(task_id)?,
                    None => {
                        let query = Query::new().order_by("uploadedAt", SortOrder::Asc);
                        repos.evidence.list(Some(&query))?
                    }
                };
                if *json {
                    print_json(ui, &evidence)?;
                } else {
                    show_evidence(ui, &evidence);
                }
            }
            EvidenceCommand::Remove { id } => {
                let removed = repos.remove_evidence(id)?;
                ui.success(&format!("Removed '{}'", removed.file_name));
            }
        }

        Ok(CommandResult::success())
    }
}

fn show_evidence(ui: &mut dyn UserInterface, evidence: &[Evidence]) {
    if evidence.is_empty() {
        ui.message("No evidence attached.");
        return;
    }

    let theme = ui.theme();
    let mut table = Table::new(["ID", "Task", "Kind", "File", "Size", "Sync"]);
    for item in evidence {
        table.add_row([
            item.id().to_string(),
            item.task_id.clone(),
            item.kind.to_string(),
            item.file_name.clone(),
            format_bytes(item.file.size_bytes),
            sync_cell(&theme, &item.sync),
        ]);
    }
    ui.show_table(&table);
}
