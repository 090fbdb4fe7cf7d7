//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::cli::workspace::Workspace;
use crate::error::Result;
use crate::ui::UserInterface;

use super::completions::CompletionsCommand;
use super::evidence::EvidenceCommandRunner;
use super::history::HistoryCommand;
use super::init::InitCommand;
use super::project::ProjectCommandRunner;
use super::status::StatusCommand;
use super::sync::SyncCommand;
use super::task::TaskCommandRunner;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Exit codes shared by commands.
pub mod exit_code {
    /// A run finished but some records failed, or the request was rejected.
    pub const FAILURE: i32 = 1;
    /// Required configuration is missing.
    pub const NOT_CONFIGURED: i32 = 2;
    /// The command needs the network and the workspace is offline.
    pub const OFFLINE: i32 = 3;
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    workspace_root: PathBuf,
    offline: bool,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given workspace root.
    pub fn new(workspace_root: PathBuf, offline: bool) -> Self {
        Self {
            workspace_root,
            offline,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn workspace(&self) -> Result<Workspace> {
        Workspace::load(&self.workspace_root, self.offline)
    }

    /// Dispatch and execute a command.
    ///
    /// `init` and `completions` run without loading the workspace config.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Init(args) => {
                InitCommand::new(&self.workspace_root, args.clone()).execute(ui)
            }
            Commands::Completions(args) => CompletionsCommand::new(args.clone()).execute(ui),
            Commands::Project(cmd) => {
                ProjectCommandRunner::new(self.workspace()?, cmd.clone()).execute(ui)
            }
            Commands::Task(cmd) => {
                TaskCommandRunner::new(self.workspace()?, cmd.clone()).execute(ui)
            }
            Commands::Evidence(cmd) => {
                EvidenceCommandRunner::new(self.workspace()?, cmd.clone()).execute(ui)
            }
            Commands::Status(args) => {
                StatusCommand::new(self.workspace()?, args.clone()).execute(ui)
            }
            Commands::Sync(args) => SyncCommand::new(self.workspace()?, args.clone()).execute(ui),
            Commands::History(args) => {
                HistoryCommand::new(self.workspace()?, args.clone()).execute(ui)
            }
        }
    }
}
