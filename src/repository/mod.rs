//! Typed repositories over the generic store.
//!
//! [`Repositories`] is the composition root: it opens one backend and
//! builds every repository on top of it. Construct it once and pass it by
//! reference (or `Arc`) to whatever needs it.

pub mod evidence;
pub mod projects;
pub mod queue;
pub mod tasks;
pub mod validators;

pub use evidence::EvidenceRepository;
pub use projects::ProjectRepository;
pub use queue::{SyncQueueState, SyncQueueStore, SyncRunRecord, SyncTrigger};
pub use tasks::{NewTask, TaskChanges, TaskRepository};
pub use validators::{EvidenceRules, ProjectRules, TaskRules};

use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, TaskSyncError};
use crate::records::Evidence;
use crate::store::{open_backend, BackendKind, MemoryBackend, Record, StorageBackend};

/// Keys owned by the sync tracker, stripped from user patches.
const SYNC_KEYS: &[&str] = &["needsSync", "syncStatus", "syncError", "lastSyncedAt"];

/// Turn a user patch into one that cannot touch sync bookkeeping or the
/// `frozen` keys, and that marks the record dirty.
fn dirtying_patch(collection: &str, partial: Value, frozen: &[&str]) -> Result<Value> {
    let Value::Object(mut partial) = partial else {
        return Err(TaskSyncError::Validation {
            collection: collection.to_string(),
            message: "patch must be a JSON object".to_string(),
        });
    };

    for key in SYNC_KEYS.iter().chain(frozen) {
        partial.remove(*key);
    }
    partial.insert("needsSync".to_string(), json!(true));
    partial.insert("syncStatus".to_string(), json!("pending"));
    Ok(Value::Object(partial))
}

/// Every repository, sharing one storage backend.
pub struct Repositories {
    pub projects: ProjectRepository,
    pub tasks: TaskRepository,
    pub evidence: EvidenceRepository,
    pub queue: SyncQueueStore,
    backend: Arc<dyn StorageBackend>,
}

impl Repositories {
    pub fn new(backend: Arc<dyn StorageBackend>, history_retention: usize) -> Self {
        Self {
            projects: ProjectRepository::new(backend.clone()),
            tasks: TaskRepository::new(backend.clone()),
            evidence: EvidenceRepository::new(backend.clone()),
            queue: SyncQueueStore::with_retention(backend.clone(), history_retention),
            backend,
        }
    }

    /// Open repositories on a backend of the given kind.
    pub fn open(kind: BackendKind, data_dir: &Path, history_retention: usize) -> Self {
        tracing::debug!("Opening {:?} storage at {}", kind, data_dir.display());
        Self::new(open_backend(kind, data_dir), history_retention)
    }

    /// Repositories backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            SyncQueueState::DEFAULT_HISTORY_RETENTION,
        )
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Store evidence and append it to its task's `evidenceIds`.
    ///
    /// The task must exist. Both records end up dirty.
    pub fn add_evidence(&self, evidence: Evidence) -> Result<Evidence> {
        let task = self.tasks.require(&evidence.task_id)?;
        let created = self.evidence.create(evidence)?;

        if let Err(e) = self.tasks.attach_evidence(task.id(), created.id()) {
            // Keep the two collections consistent: drop the unattached evidence.
            let _ = self.evidence.delete(created.id());
            return Err(e);
        }
        Ok(created)
    }

    /// Remove evidence and detach it from its task.
    ///
    /// A task that no longer exists is not an error.
    pub fn remove_evidence(&self, id: &str) -> Result<Evidence> {
        let removed = self.evidence.delete(id)?;
        match self.tasks.detach_evidence(&removed.task_id, id) {
            Ok(_) | Err(TaskSyncError::NotFound { .. }) => Ok(removed),
            Err(e) => Err(e),
        }
    }
}
