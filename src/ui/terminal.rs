//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{
    should_use_colors, OutputMode, ProgressSpinner, SpinnerHandle, TaskSyncTheme, UserInterface,
};

/// Terminal UI implementation.
///
/// Status lines go to stdout, errors to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: TaskSyncTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, no_color: bool) -> Self {
        let colors = should_use_colors(no_color);
        if !colors {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: TaskSyncTheme::for_colors(colors),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn hint(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "  {}", self.theme.hint.apply_to(msg)).ok();
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_header(title)).ok();
        }
    }

    fn raw(&mut self, text: &str) {
        writeln!(self.out, "{}", text).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if !self.mode.shows_spinners() {
            Box::new(ProgressSpinner::hidden())
        } else if self.err.is_term() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::lines_only(self.theme.clone()))
        }
    }

    fn theme(&self) -> TaskSyncTheme {
        self.theme.clone()
    }
}
