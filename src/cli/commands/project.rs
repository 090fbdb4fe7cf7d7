//! `tasksync project` subcommands.

use crate::cli::args::ProjectCommand;
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::records::Project;
use crate::store::{Query, Record, SortOrder};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::{print_json, report_created};

pub struct ProjectCommandRunner {
    workspace: Workspace,
    command: ProjectCommand,
}

impl ProjectCommandRunner {
    pub fn new(workspace: Workspace, command: ProjectCommand) -> Self {
        Self { workspace, command }
    }
}

impl Command for ProjectCommandRunner {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let repos = self.workspace.open_repositories();

        match &self.command {
            ProjectCommand::Add { name, description } => {
                let project = repos.projects.create(name, description)?;
                report_created(ui, "project", &project.name, project.id());
            }
            ProjectCommand::List { json } => {
                let query = Query::new().order_by("createdAt", SortOrder::Asc);
                let projects = repos.projects.list(Some(&query))?;
                if *json {
                    print_json(ui, &projects)?;
                } else {
                    show_projects(ui, &projects, |id| {
                        repos.tasks.list_by_project(id).map(|t| t.len())
                    })?;
                }
            }
        }

        Ok(CommandResult::success())
    }
}

fn show_projects(
    ui: &mut dyn UserInterface,
    projects: &[Project],
    task_count: impl Fn(&str) -> Result<usize>,
) -> Result<()> {
    if projects.is_empty() {
        ui.message("No projects yet.");
        ui.hint("Create one with: tasksync project add <name>");
        return Ok(());
    }

    let mut table = Table::new(["ID", "Name", "Tasks", "Description"]);
    for project in projects {
        table.add_row([
            project.id().to_string(),
            project.name.clone(),
            task_count(project.id())?.to_string(),
            project.description.clone(),
        ]);
    }
    ui.show_table(&table);
    Ok(())
}
