//! Evidence repository.
//!
//! Edits mark the evidence dirty the same way task edits do. The owning
//! task is fixed at creation: `taskId` is never changed by an edit.

use serde_json::Value;
use std::sync::Arc;

use super::dirtying_patch;
use super::validators::EvidenceRules;
use crate::error::{Result, TaskSyncError};
use crate::records::{Evidence, SyncFields};
use crate::store::{PersistentStore, Query, SortOrder, StorageBackend};

pub const COLLECTION: &str = "evidence";

pub struct EvidenceRepository {
    store: PersistentStore<Evidence>,
}

impl EvidenceRepository {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: PersistentStore::with_hooks(COLLECTION, backend, EvidenceRules),
        }
    }

    /// The underlying collection, for sync bookkeeping.
    pub fn store(&self) -> &PersistentStore<Evidence> {
        &self.store
    }

    /// Store new evidence. Sync fields are reset to pending.
    pub fn create(&self, mut evidence: Evidence) -> Result<Evidence> {
        evidence.sync = SyncFields::pending();
        self.store.create(evidence)
    }

    pub fn get(&self, id: &str) -> Result<Option<Evidence>> {
        self.store.get_by_id(id)
    }

    pub fn require(&self, id: &str) -> Result<Evidence> {
        self.get(id)?.ok_or_else(|| TaskSyncError::NotFound {
            collection: COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    pub fn list(&self, query: Option<&Query<Evidence>>) -> Result<Vec<Evidence>> {
        self.store.get_all(query)
    }

    /// Evidence attached to one task, in upload order.
    pub fn list_for_task(&self, task_id: &str) -> Result<Vec<Evidence>> {
        let query = Query::new()
            .where_eq("taskId", task_id)
            .order_by("uploadedAt", SortOrder::Asc);
        self.store.get_all(Some(&query))
    }

    /// Replace the evidence wholesale and mark it dirty.
    ///
    /// The stored `taskId` and sync bookkeeping are kept.
    pub fn put(&self, id: &str, replacement: Evidence) -> Result<Evidence> {
        self.store.update_with(id, |evidence| {
            let task_id = std::mem::take(&mut evidence.task_id);
            let sync = std::mem::take(&mut evidence.sync);
            *evidence = replacement;
            evidence.task_id = task_id;
            evidence.sync = sync;
            evidence.sync.mark_pending();
        })
    }

    /// Shallow-merge a JSON patch and mark the evidence dirty.
    pub fn patch(&self, id: &str, partial: Value) -> Result<Evidence> {
        self.store.patch(id, dirtying_patch(COLLECTION, partial, &["taskId"])?)
    }

    pub fn delete(&self, id: &str) -> Result<Evidence> {
        self.store.delete(id)
    }

    /// Evidence a sync run should select.
    pub fn dirty(&self) -> Result<Vec<Evidence>> {
        let query = Query::new().where_fn(|e: &Evidence| e.sync.is_dirty());
        self.store.get_all(Some(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EvidenceKind, FileRef, SyncStatus};
    use crate::store::{MemoryBackend, Record};
    use serde_json::json;

    fn evidence(task_id: &str, name: &str) -> Evidence {
        Evidence::new(
            task_id,
            EvidenceKind::Document,
            name,
            FileRef::new(format!("file:///tmp/{}", name), 3),
        )
    }

    #[test]
    fn create_forces_pending() {
        let repo = EvidenceRepository::new(Arc::new(MemoryBackend::new()));
        let mut input = evidence("t1", "a.pdf");
        input.sync.mark_synced(chrono::Utc::now());

        let created = repo.create(input).unwrap();
        assert_eq!(created.sync.sync_status, SyncStatus::Pending);
        assert_eq!(repo.dirty().unwrap().len(), 1);
    }

    #[test]
    fn list_for_task_filters() {
        let repo = EvidenceRepository::new(Arc::new(MemoryBackend::new()));
        repo.create(evidence("t1", "a.pdf")).unwrap();
        repo.create(evidence("t2", "b.pdf")).unwrap();
        repo.create(evidence("t1", "c.pdf")).unwrap();

        let names: Vec<_> = repo
            .list_for_task("t1")
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, vec!["a.pdf", "c.pdf"]);
    }

    fn mark_synced(repo: &EvidenceRepository, id: &str) {
        repo.store()
            .update_many(&[id.to_string()], |e| {
                e.sync.mark_synced(chrono::Utc::now());
                true
            })
            .unwrap();
    }

    #[test]
    fn patch_makes_synced_evidence_dirty() {
        let repo = EvidenceRepository::new(Arc::new(MemoryBackend::new()));
        let created = repo.create(evidence("t1", "a.jpg")).unwrap();
        mark_synced(&repo, created.id());
        assert!(repo.dirty().unwrap().is_empty());

        let patched = repo
            .patch(
                created.id(),
                json!({ "fileName": "b.jpg", "needsSync": false, "taskId": "t9" }),
            )
            .unwrap();

        assert_eq!(patched.file_name, "b.jpg");
        assert_eq!(patched.task_id, "t1");
        assert!(patched.sync.needs_sync);
        assert_eq!(patched.sync.sync_status, SyncStatus::Pending);
        assert!(patched.sync.last_synced_at.is_some());
        assert_eq!(repo.dirty().unwrap().len(), 1);
    }

    #[test]
    fn put_keeps_owner_and_marks_dirty() {
        let repo = EvidenceRepository::new(Arc::new(MemoryBackend::new()));
        let created = repo.create(evidence("t1", "a.pdf")).unwrap();
        mark_synced(&repo, created.id());

        let replaced = repo.put(created.id(), evidence("t2", "scan.pdf")).unwrap();

        assert_eq!(replaced.id(), created.id());
        assert_eq!(replaced.task_id, "t1");
        assert_eq!(replaced.file_name, "scan.pdf");
        assert!(replaced.sync.needs_sync);
        assert_eq!(replaced.sync.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let repo = EvidenceRepository::new(Arc::new(MemoryBackend::new()));
        let created = repo.create(evidence("t1", "a.pdf")).unwrap();

        repo.delete(created.id()).unwrap();
        assert!(matches!(
            repo.delete(created.id()).unwrap_err(),
            TaskSyncError::NotFound { .. }
        ));
    }
}
