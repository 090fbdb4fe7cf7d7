//! Per-record sync state transitions and aggregate counts.
//!
//! ```text
//! pending -> syncing -> synced
//!                    -> failed -> (next run) syncing ...
//! synced  -> pending            (local mutation)
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::status::SyncStatusData;
use super::transport::SyncBatch;
use crate::error::Result;
use crate::records::{RecordKind, SyncStatus, Syncable};
use crate::repository::Repositories;
use crate::store::{PersistentStore, Record};

/// Final verdict for one submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Synced,
    Failed(String),
}

/// Counts of records whose transition was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedCounts {
    pub synced_tasks: usize,
    pub synced_evidence: usize,
    pub failed_tasks: usize,
    pub failed_evidence: usize,
}

/// Record counts by sync status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub total: usize,
    pub pending: usize,
    pub synced: usize,
    pub failed: usize,
}

impl SyncCounts {
    fn add(&mut self, status: SyncStatus) {
        self.total += 1;
        match status {
            SyncStatus::Pending | SyncStatus::Syncing => self.pending += 1,
            SyncStatus::Synced => self.synced += 1,
            SyncStatus::Failed => self.failed += 1,
        }
    }
}

/// Reads and writes the sync fields of tasks and evidence.
pub struct SyncStateTracker<'a> {
    repos: &'a Repositories,
}

impl<'a> SyncStateTracker<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// The current dirty working set.
    pub fn select_dirty(&self) -> Result<SyncBatch> {
        Ok(SyncBatch {
            tasks: self.repos.tasks.dirty()?,
            evidence: self.repos.evidence.dirty()?,
        })
    }

    /// Move every record of `selection` to `syncing`.
    ///
    /// Returns the batch as persisted, which is what gets submitted.
    pub fn mark_syncing(&self, selection: &SyncBatch) -> Result<SyncBatch> {
        let task_ids: Vec<String> = selection.tasks.iter().map(|t| t.meta.id.clone()).collect();
        let evidence_ids: Vec<String> = selection
            .evidence
            .iter()
            .map(|e| e.meta.id.clone())
            .collect();

        Ok(SyncBatch {
            tasks: mark_syncing(self.repos.tasks.store(), &task_ids)?,
            evidence: mark_syncing(self.repos.evidence.store(), &evidence_ids)?,
        })
    }

    /// Apply final verdicts, given in response order.
    ///
    /// Only records still in `syncing` are resolved: a record mutated
    /// locally while the run was in flight stays `pending` so its newer
    /// content is pushed next time.
    pub fn apply(
        &self,
        resolutions: &[(RecordKind, String, Resolution)],
        at: DateTime<Utc>,
    ) -> Result<AppliedCounts> {
        let (tasks, evidence) = split_by_kind(resolutions);

        let (synced_tasks, failed_tasks) = resolve(self.repos.tasks.store(), &tasks, at)?;
        let (synced_evidence, failed_evidence) =
            resolve(self.repos.evidence.store(), &evidence, at)?;

        Ok(AppliedCounts {
            synced_tasks,
            synced_evidence,
            failed_tasks,
            failed_evidence,
        })
    }

    /// Fail every listed record that is still `syncing`.
    ///
    /// Used when a run aborts on a storage error after records were marked.
    /// Each collection is attempted even if the other cannot be written;
    /// write errors are logged, not returned. Returns how many records were
    /// moved to `failed`.
    pub fn release(&self, keys: &[(RecordKind, String)], reason: &str) -> usize {
        let resolutions: Vec<(RecordKind, String, Resolution)> = keys
            .iter()
            .map(|(kind, id)| (*kind, id.clone(), Resolution::Failed(reason.to_string())))
            .collect();
        let (tasks, evidence) = split_by_kind(&resolutions);
        let now = Utc::now();

        let mut released = 0;
        for (kind, result) in [
            (RecordKind::Task, resolve(self.repos.tasks.store(), &tasks, now)),
            (
                RecordKind::Evidence,
                resolve(self.repos.evidence.store(), &evidence, now),
            ),
        ] {
            match result {
                Ok((_, failed)) => released += failed,
                Err(e) => tracing::error!("Could not release in-flight {} records: {}", kind, e),
            }
        }
        released
    }

    /// Counts across tasks and evidence.
    pub fn counts(&self) -> Result<SyncCounts> {
        let mut counts = SyncCounts::default();
        for task in self.repos.tasks.list(None)? {
            counts.add(task.sync.sync_status);
        }
        for evidence in self.repos.evidence.list(None)? {
            counts.add(evidence.sync.sync_status);
        }
        Ok(counts)
    }

    /// Build the aggregate snapshot.
    pub fn snapshot(&self, is_online: bool, is_syncing: bool) -> Result<SyncStatusData> {
        let tasks = self.repos.tasks.list(None)?;
        let evidence = self.repos.evidence.list(None)?;

        let mut counts = SyncCounts::default();
        for status in tasks
            .iter()
            .map(|t| t.sync.sync_status)
            .chain(evidence.iter().map(|e| e.sync.sync_status))
        {
            counts.add(status);
        }

        Ok(SyncStatusData {
            is_online,
            is_syncing,
            total_items: counts.total,
            pending_items: counts.pending,
            synced_items: counts.synced,
            failed_items: counts.failed,
            last_sync_at: self.repos.queue.last_sync_at()?,
            tasks: tasks.into_iter().filter(|t| t.sync.is_dirty()).collect(),
            evidence: evidence.into_iter().filter(|e| e.sync.is_dirty()).collect(),
        })
    }
}

fn mark_syncing<T: Syncable>(store: &PersistentStore<T>, ids: &[String]) -> Result<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    store.update_many(ids, |item| {
        item.sync_fields_mut().mark_syncing();
        true
    })
}

type Verdicts = Vec<(String, Resolution)>;

fn split_by_kind(resolutions: &[(RecordKind, String, Resolution)]) -> (Verdicts, Verdicts) {
    let mut tasks = Vec::new();
    let mut evidence = Vec::new();
    for (kind, id, resolution) in resolutions {
        match kind {
            RecordKind::Task => tasks.push((id.clone(), resolution.clone())),
            RecordKind::Evidence => evidence.push((id.clone(), resolution.clone())),
        }
    }
    (tasks, evidence)
}

/// Returns `(synced, failed)` counts of applied transitions.
fn resolve<T: Syncable>(
    store: &PersistentStore<T>,
    resolutions: &[(String, Resolution)],
    at: DateTime<Utc>,
) -> Result<(usize, usize)> {
    if resolutions.is_empty() {
        return Ok((0, 0));
    }

    // Later verdicts for the same ID win.
    let mut by_id: HashMap<&str, &Resolution> = HashMap::new();
    for (id, resolution) in resolutions {
        by_id.insert(id.as_str(), resolution);
    }
    let ids: Vec<String> = by_id.keys().map(|id| id.to_string()).collect();

    let updated = store.update_many(&ids, |item| {
        if item.sync_fields().sync_status != SyncStatus::Syncing {
            tracing::debug!(
                "{} {} changed during sync, leaving it {}",
                T::KIND,
                item.id(),
                item.sync_fields().sync_status
            );
            return false;
        }
        match by_id.get(item.id()) {
            Some(Resolution::Synced) => {
                item.sync_fields_mut().mark_synced(at);
                tracing::debug!("{} {} synced", T::KIND, item.id());
                true
            }
            Some(Resolution::Failed(reason)) => {
                item.sync_fields_mut().mark_failed(reason.clone());
                tracing::warn!("{} {} failed to sync: {}", T::KIND, item.id(), reason);
                true
            }
            None => false,
        }
    })?;

    let synced = updated
        .iter()
        .filter(|i| i.sync_fields().sync_status == SyncStatus::Synced)
        .count();
    let failed = updated
        .iter()
        .filter(|i| i.sync_fields().sync_status == SyncStatus::Failed)
        .count();
    Ok((synced, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Evidence, EvidenceKind, FileRef};
    use crate::repository::NewTask;
    use serde_json::json;

    fn setup() -> (Repositories, String, String) {
        let repos = Repositories::in_memory();
        let task = repos.tasks.create(NewTask::new("p1", "Inspect")).unwrap();
        let evidence = repos
            .add_evidence(Evidence::new(
                task.id(),
                EvidenceKind::Photo,
                "a.jpg",
                FileRef::new("file:///a.jpg", 1),
            ))
            .unwrap();
        (repos, task.id().to_string(), evidence.id().to_string())
    }

    #[test]
    fn select_and_mark_syncing() {
        let (repos, task_id, evidence_id) = setup();
        let tracker = SyncStateTracker::new(&repos);

        let selection = tracker.select_dirty().unwrap();
        assert_eq!(selection.len(), 2);

        let batch = tracker.mark_syncing(&selection).unwrap();
        assert_eq!(batch.tasks[0].sync.sync_status, SyncStatus::Syncing);

        let task = repos.tasks.require(&task_id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Syncing);
        assert!(task.sync.needs_sync);
        let evidence = repos.evidence.require(&evidence_id).unwrap();
        assert_eq!(evidence.sync.sync_status, SyncStatus::Syncing);
    }

    #[test]
    fn apply_resolves_both_kinds() {
        let (repos, task_id, evidence_id) = setup();
        let tracker = SyncStateTracker::new(&repos);
        tracker
            .mark_syncing(&tracker.select_dirty().unwrap())
            .unwrap();

        let counts = tracker
            .apply(
                &[
                    (RecordKind::Evidence, evidence_id.clone(), Resolution::Synced),
                    (
                        RecordKind::Task,
                        task_id.clone(),
                        Resolution::Failed("rejected".to_string()),
                    ),
                ],
                Utc::now(),
            )
            .unwrap();

        assert_eq!(
            counts,
            AppliedCounts {
                synced_tasks: 0,
                synced_evidence: 1,
                failed_tasks: 1,
                failed_evidence: 0,
            }
        );

        let task = repos.tasks.require(&task_id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Failed);
        assert_eq!(task.sync.sync_error.as_deref(), Some("rejected"));
        let evidence = repos.evidence.require(&evidence_id).unwrap();
        assert!(!evidence.sync.needs_sync);
        assert!(evidence.sync.last_synced_at.is_some());
    }

    #[test]
    fn later_verdict_wins() {
        let (repos, task_id, _) = setup();
        let tracker = SyncStateTracker::new(&repos);
        tracker
            .mark_syncing(&tracker.select_dirty().unwrap())
            .unwrap();

        tracker
            .apply(
                &[
                    (
                        RecordKind::Task,
                        task_id.clone(),
                        Resolution::Failed("first".to_string()),
                    ),
                    (RecordKind::Task, task_id.clone(), Resolution::Synced),
                ],
                Utc::now(),
            )
            .unwrap();

        let task = repos.tasks.require(&task_id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn mutation_during_run_is_not_overwritten() {
        let (repos, task_id, _) = setup();
        let tracker = SyncStateTracker::new(&repos);
        tracker
            .mark_syncing(&tracker.select_dirty().unwrap())
            .unwrap();

        let edited = repos
            .tasks
            .patch(&task_id, json!({ "title": "Edited mid-sync" }))
            .unwrap();

        let counts = tracker
            .apply(
                &[(RecordKind::Task, task_id.clone(), Resolution::Synced)],
                Utc::now(),
            )
            .unwrap();

        assert_eq!(counts.synced_tasks, 0);
        let task = repos.tasks.require(&task_id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Pending);
        assert!(task.sync.needs_sync);
        assert_eq!(task.meta.updated_at, edited.meta.updated_at);
    }

    #[test]
    fn release_fails_only_in_flight_records() {
        let (repos, task_id, evidence_id) = setup();
        let tracker = SyncStateTracker::new(&repos);
        let selection = tracker.select_dirty().unwrap();
        tracker.mark_syncing(&selection).unwrap();
        tracker
            .apply(
                &[(RecordKind::Evidence, evidence_id.clone(), Resolution::Synced)],
                Utc::now(),
            )
            .unwrap();

        let released = tracker.release(&selection.keys(), "disk full");

        assert_eq!(released, 1);
        let task = repos.tasks.require(&task_id).unwrap();
        assert_eq!(task.sync.sync_status, SyncStatus::Failed);
        assert_eq!(task.sync.sync_error.as_deref(), Some("disk full"));
        let evidence = repos.evidence.require(&evidence_id).unwrap();
        assert_eq!(evidence.sync.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn counts_group_syncing_with_pending() {
        let (repos, task_id, _) = setup();
        let tracker = SyncStateTracker::new(&repos);
        tracker
            .mark_syncing(&tracker.select_dirty().unwrap())
            .unwrap();
        tracker
            .apply(
                &[(RecordKind::Task, task_id, Resolution::Synced)],
                Utc::now(),
            )
            .unwrap();

        let counts = tracker.counts().unwrap();
        assert_eq!(
            counts,
            SyncCounts {
                total: 2,
                pending: 1,
                synced: 1,
                failed: 0,
            }
        );
    }

    #[test]
    fn snapshot_lists_dirty_records() {
        let (repos, _, _) = setup();
        let snapshot = SyncStateTracker::new(&repos)
            .snapshot(true, false)
            .unwrap();

        assert!(snapshot.is_online);
        assert_eq!(snapshot.total_items, 2);
        assert_eq!(snapshot.pending_items, 2);
        assert_eq!(snapshot.dirty_items(), 2);
        assert!(snapshot.last_sync_at.is_none());
    }
}
