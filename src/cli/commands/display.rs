//! Shared display helpers for record and sync output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, TaskSyncError};
use crate::records::SyncFields;
use crate::ui::{format_relative_time, TaskSyncTheme, UserInterface};

/// Sync column for a record table. Failed records carry their reason.
pub fn sync_cell(theme: &TaskSyncTheme, sync: &SyncFields) -> String {
    let status = theme.format_sync_status(sync.sync_status);
    match &sync.sync_error {
        Some(reason) if sync.is_dirty() => format!("{} ({})", status, reason),
        _ => status,
    }
}

/// "3 minutes ago (2026-01-02 10:00 UTC)", or "never".
pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format!(
            "{} ({})",
            format_relative_time(at, Utc::now()),
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "never".to_string(),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Write `value` as pretty JSON through the UI's raw channel.
pub fn print_json<T: Serialize + ?Sized>(ui: &mut dyn UserInterface, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TaskSyncError::Other(anyhow::Error::new(e)))?;
    ui.raw(&json);
    Ok(())
}

/// Announce a newly created record. Quiet mode prints only the ID.
pub fn report_created(ui: &mut dyn UserInterface, what: &str, label: &str, id: &str) {
    if ui.output_mode().shows_status() {
        ui.success(&format!("Created {} '{}' ({})", what, label, id));
    } else {
        ui.raw(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SyncStatus;
    use crate::ui::{MockUI, OutputMode};

    #[test]
    fn failed_cell_shows_reason() {
        let theme = TaskSyncTheme::plain();
        let mut sync = SyncFields::pending();
        sync.mark_syncing();
        sync.mark_failed("rejected");
        assert_eq!(sync_cell(&theme, &sync), "✗ failed (rejected)");
    }

    #[test]
    fn synced_cell_has_no_reason() {
        let theme = TaskSyncTheme::plain();
        let mut sync = SyncFields::pending();
        sync.mark_synced(Utc::now());
        assert_eq!(sync.sync_status, SyncStatus::Synced);
        assert_eq!(sync_cell(&theme, &sync), "✓ synced");
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(None), "never");
        assert!(format_timestamp(Some(Utc::now())).starts_with("just now ("));
    }

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn quiet_creation_prints_bare_id() {
        let mut ui = MockUI::with_mode(OutputMode::Quiet);
        report_created(&mut ui, "task", "Inspect", "123-abc");
        assert_eq!(ui.raw_output(), "123-abc");
        assert!(ui.successes().is_empty());

        let mut ui = MockUI::new();
        report_created(&mut ui, "task", "Inspect", "123-abc");
        assert!(ui.has_success("Created task 'Inspect' (123-abc)"));
    }
}
