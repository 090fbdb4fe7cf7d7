//! `tasksync task` subcommands.

use crate::cli::args::{TaskAddArgs, TaskCommand, TaskEditArgs, TaskListArgs};
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::records::{Task, TaskStatus};
use crate::repository::{NewTask, Repositories, TaskChanges};
use crate::store::{Query, Record, SortOrder};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{exit_code, Command, CommandResult};
use super::display::{print_json, report_created, sync_cell};

pub struct TaskCommandRunner {
    workspace: Workspace,
    command: TaskCommand,
}

impl TaskCommandRunner {
    pub fn new(workspace: Workspace, command: TaskCommand) -> Self {
        Self { workspace, command }
    }

    fn add(
        &self,
        repos: &Repositories,
        args: &TaskAddArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        // The store does not enforce this reference.
        repos.projects.require(&args.project)?;

        let mut new = NewTask::new(&args.project, &args.title).description(&args.description);
        if let Some(due) = args.due {
            new = new.due(due);
        }
        let task = repos.tasks.create(new)?;
        report_created(ui, "task", &task.title, task.id());
        Ok(())
    }

    fn list(
        &self,
        repos: &Repositories,
        args: &TaskListArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        let project = args.project.clone();
        let status = args.status.map(TaskStatus::from);
        let dirty = args.dirty;
        let query = Query::new()
            .where_fn(move |t: &Task| {
                project.as_ref().is_none_or(|p| &t.project_id == p)
                    && status.is_none_or(|s| t.status == s)
                    && (!dirty || t.sync.is_dirty())
            })
            .order_by("createdAt", SortOrder::Asc);

        let tasks = repos.tasks.list(Some(&query))?;
        if args.json {
            return print_json(ui, &tasks);
        }

        if tasks.is_empty() {
            ui.message("No matching tasks.");
            return Ok(());
        }

        let theme = ui.theme();
        let mut table = Table::new(["ID", "Title", "Status", "Due", "Evidence", "Sync"]);
        for task in &tasks {
            table.add_row([
                task.id().to_string(),
                task.title.clone(),
                task.status.to_string(),
                task.due_date.map(|d| d.to_string()).unwrap_or_default(),
                task.evidence_ids.len().to_string(),
                sync_cell(&theme, &task.sync),
            ]);
        }
        ui.show_table(&table);
        Ok(())
    }

    fn edit(
        &self,
        repos: &Repositories,
        args: &TaskEditArgs,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let changes = TaskChanges {
            title: args.title.clone(),
            description: args.description.clone(),
            status: None,
            due_date: if args.clear_due {
                Some(None)
            } else {
                args.due.map(Some)
            },
        };
        if changes.is_empty() {
            ui.error("Nothing to change");
            ui.hint("Pass --title, --description, --due or --clear-due.");
            return Ok(CommandResult::failure(exit_code::FAILURE));
        }

        let task = repos.tasks.update(&args.id, changes)?;
        ui.success(&format!("Updated task '{}'", task.title));
        Ok(CommandResult::success())
    }
}

impl Command for TaskCommandRunner {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let repos = self.workspace.open_repositories();

        match &self.command {
            TaskCommand::Add(args) => self.add(&repos, args, ui)?,
            TaskCommand::List(args) => self.list(&repos, args, ui)?,
            TaskCommand::Edit(args) => return self.edit(&repos, args, ui),
            TaskCommand::Complete { id } => {
                let task = repos.tasks.complete(id)?;
                ui.success(&format!("Completed '{}'", task.title));
            }
            TaskCommand::Reopen { id } => {
                let task = repos.tasks.reopen(id)?;
                ui.success(&format!("Reopened '{}'", task.title));
            }
            TaskCommand::Delete { id } => {
                let task = repos.tasks.delete(id)?;
                ui.success(&format!("Deleted '{}'", task.title));
                if !task.evidence_ids.is_empty() {
                    ui.warning(&format!(
                        "{} evidence record(s) still reference this task",
                        task.evidence_ids.len()
                    ));
                }
            }
        }

        Ok(CommandResult::success())
    }
}
