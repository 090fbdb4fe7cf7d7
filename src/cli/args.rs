//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::records::{EvidenceKind, TaskStatus};

/// tasksync - offline-first tasks and evidence with batched remote sync.
#[derive(Debug, Parser)]
#[command(name = "tasksync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root (defaults to the nearest directory containing .tasksync/)
    #[arg(short = 'C', long, global = true, env = "TASKSYNC_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Treat the network as unavailable
    #[arg(long, global = true)]
    pub offline: bool,

    /// Show per-record detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create .tasksync/ with a starter configuration
    Init(InitArgs),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage task evidence (photos and documents)
    #[command(subcommand)]
    Evidence(EvidenceCommand),

    /// Show local sync state
    Status(StatusArgs),

    /// Push pending changes to the remote endpoint
    Sync(SyncArgs),

    /// Show recent sync runs
    History(HistoryArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `init` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InitArgs {
    /// Remote sync endpoint to write into the config
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List projects
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Task status as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskStatusArg {
    Pending,
    Completed,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Pending => Self::Pending,
            TaskStatusArg::Completed => Self::Completed,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    /// Create a task in a project
    Add(TaskAddArgs),

    /// List tasks
    List(TaskListArgs),

    /// Change a task's fields
    Edit(TaskEditArgs),

    /// Mark a task completed
    Complete { id: String },

    /// Mark a completed task pending again
    Reopen { id: String },

    /// Delete a task locally
    Delete { id: String },
}

#[derive(Debug, Clone, clap::Args)]
pub struct TaskAddArgs {
    /// Project the task belongs to
    #[arg(short, long)]
    pub project: String,

    pub title: String,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct TaskListArgs {
    /// Only tasks of this project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Only tasks with this status
    #[arg(long, value_enum)]
    pub status: Option<TaskStatusArg>,

    /// Only tasks waiting to be synced
    #[arg(long)]
    pub dirty: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct TaskEditArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// New due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<NaiveDate>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
}

/// Evidence kind as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvidenceKindArg {
    Photo,
    Document,
}

impl From<EvidenceKindArg> for EvidenceKind {
    fn from(arg: EvidenceKindArg) -> Self {
        match arg {
            EvidenceKindArg::Photo => Self::Photo,
            EvidenceKindArg::Document => Self::Document,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum EvidenceCommand {
    /// Attach a local file to a task
    Add(EvidenceAddArgs),

    /// List evidence
    List {
        /// Only evidence of this task
        #[arg(short, long)]
        task: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove evidence and detach it from its task
    Remove { id: String },
}

#[derive(Debug, Clone, clap::Args)]
pub struct EvidenceAddArgs {
    pub task_id: String,

    pub path: PathBuf,

    /// Kind of evidence (guessed from the extension when omitted)
    #[arg(long, value_enum)]
    pub kind: Option<EvidenceKindArg>,

    /// Display name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SyncArgs {
    /// Output the run result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `history` command.
#[derive(Debug, Clone, clap::Args)]
pub struct HistoryArgs {
    /// Number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tasksync", "status", "--offline", "--json", "-C", "/w"])
            .unwrap();
        assert!(cli.offline);
        assert_eq!(cli.workspace, Some(PathBuf::from("/w")));
        assert!(matches!(cli.command, Commands::Status(StatusArgs { json: true })));
    }

    #[test]
    fn parses_task_add_with_due_date() {
        let cli = Cli::try_parse_from([
            "tasksync", "task", "add", "--project", "p1", "Inspect roof", "--due", "2026-03-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Task(TaskCommand::Add(args)) => {
                assert_eq!(args.project, "p1");
                assert_eq!(args.title, "Inspect roof");
                assert_eq!(args.due, NaiveDate::from_ymd_opt(2026, 3, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_due_date() {
        let result =
            Cli::try_parse_from(["tasksync", "task", "add", "-p", "p1", "x", "--due", "tomorrow"]);
        assert!(result.is_err());
    }

    #[test]
    fn due_conflicts_with_clear_due() {
        let result = Cli::try_parse_from([
            "tasksync", "task", "edit", "t1", "--due", "2026-01-01", "--clear-due",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn evidence_kind_maps_to_record_kind() {
        assert_eq!(EvidenceKind::from(EvidenceKindArg::Photo), EvidenceKind::Photo);
        assert_eq!(TaskStatus::from(TaskStatusArg::Completed), TaskStatus::Completed);
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["tasksync", "history"]).unwrap();
        match cli.command {
            Commands::History(args) => assert_eq!(args.limit, 10),
            other => panic!("unexpected {:?}", other),
        }
    }
}
