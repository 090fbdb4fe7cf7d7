//! Visual theme and styling.

use console::Style;

use crate::records::SyncStatus;

/// tasksync's visual theme.
#[derive(Debug, Clone)]
pub struct TaskSyncTheme {
    /// Success messages and synced records (green).
    pub success: Style,
    /// Warnings and pending records (orange).
    pub warning: Style,
    /// Errors and failed records (red bold).
    pub error: Style,
    /// In-flight work (cyan).
    pub info: Style,
    pub dim: Style,
    pub highlight: Style,
    pub header: Style,
    pub hint: Style,
}

impl Default for TaskSyncTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSyncTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            hint: Style::new().cyan().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            hint: Style::new(),
        }
    }

    /// Pick the colored or plain theme.
    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }

    /// Icon and label for a record's sync status.
    pub fn format_sync_status(&self, status: SyncStatus) -> String {
        let (style, icon) = match status {
            SyncStatus::Pending => (&self.warning, "●"),
            SyncStatus::Syncing => (&self.info, "↻"),
            SyncStatus::Synced => (&self.success, "✓"),
            SyncStatus::Failed => (&self.error, "✗"),
        };
        format!("{}", style.apply_to(format!("{} {}", icon, status)))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }

    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    console::Term::stdout().is_term()
}
