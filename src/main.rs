//! tasksync CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tasksync::cli::{Cli, CommandDispatcher};
use tasksync::config::find_workspace_root;
use tasksync::ui::{OutputMode, TerminalUI, UserInterface};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `--debug` forces `tasksync=debug`; otherwise `RUST_LOG` applies, with
/// `tasksync=info` as the fallback. Logs go to stderr.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("tasksync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasksync=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// `-C` wins; otherwise walk up from the current directory to the nearest
/// `.tasksync/`, falling back to the current directory itself.
fn workspace_root(cli: &Cli) -> PathBuf {
    if let Some(root) = &cli.workspace {
        return root.clone();
    }
    let cwd = std::env::current_dir().unwrap_or_default();
    find_workspace_root(&cwd).unwrap_or(cwd)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("tasksync starting with args: {:?}", cli);

    let mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = TerminalUI::new(mode, cli.no_color);

    let dispatcher = CommandDispatcher::new(workspace_root(&cli), cli.offline);
    match dispatcher.dispatch(&cli, &mut ui) {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
