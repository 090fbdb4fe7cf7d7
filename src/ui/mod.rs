//! Terminal output for the tasksync CLI.
//!
//! This module provides:
//! - [`UserInterface`] trait so commands can be tested against [`MockUI`]
//! - [`TerminalUI`] for real terminal usage
//! - Spinners, tables, and time formatting helpers
//!
//! # Example
//!
//! ```
//! use tasksync::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("Synced 3 records");
//! assert!(ui.has_success("Synced"));
//! ```

pub mod format;
pub mod mock;
pub mod output;
pub mod spinner;
pub mod table;
pub mod terminal;
pub mod theme;

pub use format::{format_duration_ms, format_relative_time};
pub use mock::{MockSpinner, MockSpinnerState, MockUI, SpinnerStatus};
pub use output::OutputMode;
pub use spinner::ProgressSpinner;
pub use table::Table;
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, TaskSyncTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Display a dim follow-up hint.
    fn hint(&mut self, msg: &str);

    /// Show a header line.
    fn show_header(&mut self, title: &str);

    /// Render a table.
    fn show_table(&mut self, table: &Table) {
        self.message(&table.render());
    }

    /// Machine-readable output (JSON). Written regardless of mode.
    fn raw(&mut self, text: &str);

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Theme for styling table cells.
    fn theme(&self) -> TaskSyncTheme;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Clear the spinner without a final line.
    fn finish_clear(&mut self);
}
