//! Synchronization bookkeeping shared by Task and Evidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Record;

/// Where a record stands relative to the remote system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Changed locally, not yet pushed.
    #[default]
    Pending,
    /// Selected by a run and handed to the transport.
    Syncing,
    /// Accepted by the remote.
    Synced,
    /// Rejected by the remote or the transport failed; retried next run.
    Failed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Sync fields flattened into every syncable record.
///
/// Invariant: `needs_sync == false` implies `sync_status == Synced`. The
/// transition methods are the only writers that keep this true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFields {
    pub needs_sync: bool,
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncFields {
    /// Fields for a freshly created local record.
    pub fn pending() -> Self {
        Self {
            needs_sync: true,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            last_synced_at: None,
        }
    }

    /// Local mutation: the record must be pushed again.
    ///
    /// `sync_error` is kept so the last failure stays visible until the
    /// next run resolves it.
    pub fn mark_pending(&mut self) {
        self.needs_sync = true;
        self.sync_status = SyncStatus::Pending;
    }

    /// Selected by a run. `needs_sync` stays true until the outcome is known.
    pub fn mark_syncing(&mut self) {
        self.needs_sync = true;
        self.sync_status = SyncStatus::Syncing;
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.needs_sync = false;
        self.sync_status = SyncStatus::Synced;
        self.sync_error = None;
        self.last_synced_at = Some(at);
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.needs_sync = true;
        self.sync_status = SyncStatus::Failed;
        self.sync_error = Some(reason.into());
    }

    /// Whether a run should select this record.
    ///
    /// Records stuck in `Syncing` after a crash still carry
    /// `needs_sync == true` and are picked up again.
    pub fn is_dirty(&self) -> bool {
        self.needs_sync || matches!(self.sync_status, SyncStatus::Pending | SyncStatus::Failed)
    }
}

impl Default for SyncFields {
    fn default() -> Self {
        Self::pending()
    }
}

/// The two record kinds that travel to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Task,
    Evidence,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => f.write_str("task"),
            Self::Evidence => f.write_str("evidence"),
        }
    }
}

/// A record carrying [`SyncFields`].
pub trait Syncable: Record {
    const KIND: RecordKind;

    fn sync_fields(&self) -> &SyncFields;

    fn sync_fields_mut(&mut self) -> &mut SyncFields;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_dirty() {
        let fields = SyncFields::pending();
        assert!(fields.needs_sync);
        assert_eq!(fields.sync_status, SyncStatus::Pending);
        assert!(fields.is_dirty());
    }

    #[test]
    fn synced_clears_error_and_flag() {
        let mut fields = SyncFields::pending();
        fields.mark_failed("boom");
        let now = Utc::now();
        fields.mark_synced(now);

        assert!(!fields.needs_sync);
        assert_eq!(fields.sync_status, SyncStatus::Synced);
        assert!(fields.sync_error.is_none());
        assert_eq!(fields.last_synced_at, Some(now));
        assert!(!fields.is_dirty());
    }

    #[test]
    fn failed_stays_dirty() {
        let mut fields = SyncFields::pending();
        fields.mark_syncing();
        fields.mark_failed("rejected");

        assert!(fields.needs_sync);
        assert_eq!(fields.sync_status, SyncStatus::Failed);
        assert_eq!(fields.sync_error.as_deref(), Some("rejected"));
        assert!(fields.is_dirty());
    }

    #[test]
    fn interrupted_syncing_is_dirty() {
        let mut fields = SyncFields::pending();
        fields.mark_syncing();
        assert!(fields.is_dirty());
    }

    #[test]
    fn mutation_after_sync_regresses() {
        let mut fields = SyncFields::pending();
        fields.mark_synced(Utc::now());
        fields.mark_pending();

        assert!(fields.needs_sync);
        assert_eq!(fields.sync_status, SyncStatus::Pending);
        assert!(fields.last_synced_at.is_some());
    }

    #[test]
    fn serializes_camel_case_without_empty_options() {
        let json = serde_json::to_value(SyncFields::pending()).unwrap();
        assert_eq!(json["needsSync"], true);
        assert_eq!(json["syncStatus"], "pending");
        assert!(json.get("syncError").is_none());
        assert!(json.get("lastSyncedAt").is_none());
    }
}
