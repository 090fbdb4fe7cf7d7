//! Command-line interface for tasksync.
//!
//! - [`args`] - argument definitions using clap derive macros
//! - [`commands`] - command implementations
//! - [`workspace`] - config and storage resolution for a workspace root

pub mod args;
pub mod commands;
pub mod workspace;

pub use args::{Cli, Commands};
pub use commands::{exit_code, Command, CommandDispatcher, CommandResult};
pub use workspace::Workspace;
