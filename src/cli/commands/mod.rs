//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Record commands share a [`Workspace`] loaded once
//! per invocation.
//!
//! [`Workspace`]: crate::cli::workspace::Workspace

pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod evidence;
pub mod history;
pub mod init;
pub mod project;
pub mod status;
pub mod sync;
pub mod task;

pub use dispatcher::{exit_code, Command, CommandDispatcher, CommandResult};
