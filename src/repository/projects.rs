//! Project repository.

use std::sync::Arc;

use super::validators::ProjectRules;
use crate::error::{Result, TaskSyncError};
use crate::records::Project;
use crate::store::{PersistentStore, Query, StorageBackend};

pub const COLLECTION: &str = "projects";

pub struct ProjectRepository {
    store: PersistentStore<Project>,
}

impl ProjectRepository {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: PersistentStore::with_hooks(COLLECTION, backend, ProjectRules),
        }
    }

    pub fn store(&self) -> &PersistentStore<Project> {
        &self.store
    }

    pub fn create(&self, name: &str, description: &str) -> Result<Project> {
        self.store
            .create(Project::new(name).with_description(description))
    }

    pub fn get(&self, id: &str) -> Result<Option<Project>> {
        self.store.get_by_id(id)
    }

    /// Like [`get`](Self::get) but a missing project is an error.
    pub fn require(&self, id: &str) -> Result<Project> {
        self.get(id)?.ok_or_else(|| TaskSyncError::NotFound {
            collection: COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    pub fn list(&self, query: Option<&Query<Project>>) -> Result<Vec<Project>> {
        self.store.get_all(query)
    }

    /// Remove a project. Its tasks are left in place.
    pub fn delete(&self, id: &str) -> Result<Project> {
        self.store.delete(id)
    }
}
