//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use tasksync::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Starting sync");
//! ui.warning("2 records failed");
//!
//! assert!(ui.has_message("Starting"));
//! assert!(ui.has_warning("failed"));
//! ```

use std::sync::{Arc, Mutex};

use super::{OutputMode, SpinnerHandle, TaskSyncTheme, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    hints: Vec<String>,
    headers: Vec<String>,
    raw: Vec<String>,
    spinners: Vec<Arc<Mutex<MockSpinnerState>>>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Everything written through [`UserInterface::raw`], joined by newlines.
    pub fn raw_output(&self) -> String {
        self.raw.join("\n")
    }

    /// Final state of each spinner, in start order.
    pub fn spinners(&self) -> Vec<MockSpinnerState> {
        self.spinners
            .iter()
            .map(|s| match s.lock() {
                Ok(state) => state.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            })
            .collect()
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    pub fn has_hint(&self, msg: &str) -> bool {
        self.hints.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn hint(&mut self, msg: &str) {
        self.hints.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn raw(&mut self, text: &str) {
        self.raw.push(text.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let state = Arc::new(Mutex::new(MockSpinnerState {
            started_with: message.to_string(),
            ..Default::default()
        }));
        self.spinners.push(Arc::clone(&state));
        Box::new(MockSpinner { state })
    }

    fn theme(&self) -> TaskSyncTheme {
        TaskSyncTheme::plain()
    }
}

/// How a mock spinner finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    Success,
    Error,
    Cleared,
}

/// Captured lifetime of one mock spinner.
#[derive(Debug, Clone, Default)]
pub struct MockSpinnerState {
    pub started_with: String,
    pub messages: Vec<String>,
    pub finish_message: Option<String>,
    pub status: Option<SpinnerStatus>,
}

/// Spinner handed out by [`MockUI`]; records into state shared with it.
#[derive(Debug)]
pub struct MockSpinner {
    state: Arc<Mutex<MockSpinnerState>>,
}

impl MockSpinner {
    fn update(&self, f: impl FnOnce(&mut MockSpinnerState)) {
        match self.state.lock() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.update(|s| s.messages.push(msg.to_string()));
    }

    fn finish_success(&mut self, msg: &str) {
        self.update(|s| {
            s.finish_message = Some(msg.to_string());
            s.status = Some(SpinnerStatus::Success);
        });
    }

    fn finish_error(&mut self, msg: &str) {
        self.update(|s| {
            s.finish_message = Some(msg.to_string());
            s.status = Some(SpinnerStatus::Error);
        });
    }

    fn finish_clear(&mut self) {
        self.update(|s| s.status = Some(SpinnerStatus::Cleared));
    }
}
