//! Task repository.
//!
//! Every user-facing mutation marks the task dirty (`needsSync = true`,
//! `syncStatus = pending`), including patches of a task that was already
//! synced. Sync bookkeeping fields cannot be set through this repository;
//! they belong to the sync tracker.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use super::dirtying_patch;
use super::validators::TaskRules;
use crate::error::{Result, TaskSyncError};
use crate::records::{Task, TaskStatus};
use crate::store::{BulkResult, Filter, PersistentStore, Query, SortOrder, StorageBackend};

pub const COLLECTION: &str = "tasks";

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    fn into_task(self) -> Task {
        let mut task = Task::new(self.project_id, self.title);
        task.description = self.description;
        task.due_date = self.due_date;
        task
    }
}

/// A typed partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

pub struct TaskRepository {
    store: PersistentStore<Task>,
}

impl TaskRepository {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: PersistentStore::with_hooks(COLLECTION, backend, TaskRules),
        }
    }

    /// The underlying collection, for sync bookkeeping.
    pub fn store(&self) -> &PersistentStore<Task> {
        &self.store
    }

    /// Create a task. New tasks always start dirty.
    pub fn create(&self, new: NewTask) -> Result<Task> {
        self.store.create(new.into_task())
    }

    pub fn create_bulk(&self, items: Vec<NewTask>) -> Result<BulkResult<Task>> {
        self.store
            .create_bulk(items.into_iter().map(NewTask::into_task).collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        self.store.get_by_id(id)
    }

    /// Like [`get`](Self::get) but a missing task is an error.
    pub fn require(&self, id: &str) -> Result<Task> {
        self.get(id)?.ok_or_else(|| TaskSyncError::NotFound {
            collection: COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    pub fn list(&self, query: Option<&Query<Task>>) -> Result<Vec<Task>> {
        self.store.get_all(query)
    }

    /// Tasks of one project, oldest first.
    pub fn list_by_project(&self, project_id: &str) -> Result<Vec<Task>> {
        let query = Query::new()
            .where_eq("projectId", project_id)
            .order_by("createdAt", SortOrder::Asc);
        self.store.get_all(Some(&query))
    }

    pub fn count(&self, filter: Option<&Filter<Task>>) -> Result<usize> {
        self.store.count(filter)
    }

    /// Apply typed changes and mark the task dirty.
    pub fn update(&self, id: &str, changes: TaskChanges) -> Result<Task> {
        self.store.update_with(id, |task| {
            changes.apply(task);
            task.sync.mark_pending();
        })
    }

    /// Replace the task's user fields wholesale and mark it dirty.
    ///
    /// The stored sync bookkeeping is kept.
    pub fn put(&self, id: &str, replacement: Task) -> Result<Task> {
        self.store.update_with(id, |task| {
            let sync = std::mem::take(&mut task.sync);
            *task = replacement;
            task.sync = sync;
            task.sync.mark_pending();
        })
    }

    /// Shallow-merge a JSON patch and mark the task dirty.
    pub fn patch(&self, id: &str, partial: Value) -> Result<Task> {
        self.store.patch(id, dirtying_patch(COLLECTION, partial, &[])?)
    }

    pub fn complete(&self, id: &str) -> Result<Task> {
        self.set_status(id, TaskStatus::Completed)
    }

    pub fn reopen(&self, id: &str) -> Result<Task> {
        self.set_status(id, TaskStatus::Pending)
    }

    /// Remove a task locally. Attached evidence is not removed.
    pub fn delete(&self, id: &str) -> Result<Task> {
        self.store.delete(id)
    }

    /// Tasks a sync run should select.
    pub fn dirty(&self) -> Result<Vec<Task>> {
        let query = Query::new().where_fn(|t: &Task| t.sync.is_dirty());
        self.store.get_all(Some(&query))
    }

    /// Append an evidence ID to the task's ordered list and mark it dirty.
    pub fn attach_evidence(&self, task_id: &str, evidence_id: &str) -> Result<Task> {
        self.store.update_with(task_id, |task| {
            if !task.evidence_ids.iter().any(|e| e == evidence_id) {
                task.evidence_ids.push(evidence_id.to_string());
            }
            task.sync.mark_pending();
        })
    }

    /// Remove an evidence ID from the task and mark it dirty.
    pub fn detach_evidence(&self, task_id: &str, evidence_id: &str) -> Result<Task> {
        self.store.update_with(task_id, |task| {
            task.evidence_ids.retain(|e| e != evidence_id);
            task.sync.mark_pending();
        })
    }

    fn set_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        self.update(
            id,
            TaskChanges {
                status: Some(status),
                ..TaskChanges::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SyncStatus;
    use crate::store::{MemoryBackend, Record};
    use chrono::Utc;
    use serde_json::json;

    fn repo() -> TaskRepository {
        TaskRepository::new(Arc::new(MemoryBackend::new()))
    }

    fn mark_synced(repo: &TaskRepository, id: &str) {
        repo.store()
            .update_many(&[id.to_string()], |t| {
                t.sync.mark_synced(Utc::now());
                true
            })
            .unwrap();
    }

    #[test]
    fn created_task_is_dirty() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();

        assert!(task.sync.needs_sync);
        assert_eq!(task.sync.sync_status, SyncStatus::Pending);
        assert_eq!(repo.dirty().unwrap().len(), 1);
    }

    #[test]
    fn patch_regresses_synced_task() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();
        mark_synced(&repo, task.id());
        assert!(repo.dirty().unwrap().is_empty());

        let patched = repo
            .patch(task.id(), json!({ "status": "completed" }))
            .unwrap();

        assert_eq!(patched.status, TaskStatus::Completed);
        assert!(patched.sync.needs_sync);
        assert_eq!(patched.sync.sync_status, SyncStatus::Pending);
        assert!(patched.sync.last_synced_at.is_some());
    }

    #[test]
    fn patch_cannot_forge_sync_state() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();

        let patched = repo
            .patch(
                task.id(),
                json!({ "needsSync": false, "syncStatus": "synced", "title": "Renamed" }),
            )
            .unwrap();

        assert_eq!(patched.title, "Renamed");
        assert!(patched.sync.needs_sync);
        assert_eq!(patched.sync.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn update_and_status_helpers_dirty_the_task() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();
        mark_synced(&repo, task.id());

        let completed = repo.complete(task.id()).unwrap();
        assert!(completed.is_completed());
        assert!(completed.sync.needs_sync);

        mark_synced(&repo, task.id());
        let reopened = repo.reopen(task.id()).unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
        assert!(reopened.sync.needs_sync);
    }

    #[test]
    fn update_clears_due_date() {
        let repo = repo();
        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let task = repo
            .create(NewTask::new("p1", "Inspect").due(due))
            .unwrap();
        assert_eq!(task.due_date, Some(due));

        let updated = repo
            .update(
                task.id(),
                TaskChanges {
                    due_date: Some(None),
                    ..TaskChanges::default()
                },
            )
            .unwrap();
        assert!(updated.due_date.is_none());
    }

    #[test]
    fn put_keeps_sync_history() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();
        mark_synced(&repo, task.id());

        let replaced = repo.put(task.id(), Task::new("p2", "Replaced")).unwrap();
        assert_eq!(replaced.id(), task.id());
        assert_eq!(replaced.project_id, "p2");
        assert!(replaced.sync.needs_sync);
        assert!(replaced.sync.last_synced_at.is_some());
    }

    #[test]
    fn list_by_project_filters() {
        let repo = repo();
        repo.create(NewTask::new("p1", "a")).unwrap();
        repo.create(NewTask::new("p2", "b")).unwrap();
        repo.create(NewTask::new("p1", "c")).unwrap();

        let titles: Vec<_> = repo
            .list_by_project("p1")
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[test]
    fn attach_and_detach_evidence() {
        let repo = repo();
        let task = repo.create(NewTask::new("p1", "Inspect")).unwrap();

        repo.attach_evidence(task.id(), "e1").unwrap();
        repo.attach_evidence(task.id(), "e2").unwrap();
        let task = repo.attach_evidence(task.id(), "e1").unwrap();
        assert_eq!(task.evidence_ids, vec!["e1", "e2"]);

        let task = repo.detach_evidence(task.id(), "e1").unwrap();
        assert_eq!(task.evidence_ids, vec!["e2"]);
    }

    #[test]
    fn missing_task_is_not_found() {
        let repo = repo();
        assert!(matches!(
            repo.complete("ghost").unwrap_err(),
            TaskSyncError::NotFound { .. }
        ));
        assert!(matches!(
            repo.patch("ghost", json!({})).unwrap_err(),
            TaskSyncError::NotFound { .. }
        ));
    }

    #[test]
    fn create_bulk_reports_invalid_indices() {
        let repo = repo();
        let result = repo
            .create_bulk(vec![
                NewTask::new("p1", "ok"),
                NewTask::new("p1", ""),
                NewTask::new("", "no project"),
                NewTask::new("p1", "ok too"),
            ])
            .unwrap();

        assert_eq!(result.created.len(), 2);
        let indices: Vec<_> = result.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
