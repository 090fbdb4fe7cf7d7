//! Snapshot and result types reported by the orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::{Evidence, Task};

/// Aggregate view of the local sync state.
///
/// `tasks` and `evidence` are the current dirty working set; the counts
/// cover every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusData {
    pub is_online: bool,
    pub is_syncing: bool,
    pub total_items: usize,
    /// Records in `pending` or `syncing`.
    pub pending_items: usize,
    pub synced_items: usize,
    pub failed_items: usize,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub tasks: Vec<Task>,
    pub evidence: Vec<Evidence>,
}

impl SyncStatusData {
    /// Number of records a run would select right now.
    pub fn dirty_items(&self) -> usize {
        self.tasks.len() + self.evidence.len()
    }
}

/// Outcome of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// True only if every submitted record succeeded.
    pub success: bool,
    /// The run found no dirty records and did nothing.
    pub nothing_to_sync: bool,
    pub synced_tasks: usize,
    pub synced_evidence: usize,
    pub failed_tasks: usize,
    pub failed_evidence: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub(crate) fn nothing_to_sync() -> Self {
        Self {
            success: true,
            nothing_to_sync: true,
            ..Self::default()
        }
    }

    pub fn synced_total(&self) -> usize {
        self.synced_tasks + self.synced_evidence
    }

    pub fn failed_total(&self) -> usize {
        self.failed_tasks + self.failed_evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_sync_is_success() {
        let result = SyncResult::nothing_to_sync();
        assert!(result.success);
        assert!(result.nothing_to_sync);
        assert_eq!(result.synced_total(), 0);
        assert_eq!(result.failed_total(), 0);
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = SyncResult {
            success: false,
            synced_tasks: 1,
            failed_evidence: 2,
            errors: vec!["boom".to_string()],
            ..SyncResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["syncedTasks"], 1);
        assert_eq!(json["failedEvidence"], 2);
        assert_eq!(json["nothingToSync"], false);
    }
}
