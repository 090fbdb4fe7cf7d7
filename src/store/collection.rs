//! Generic persistent collection.
//!
//! Every mutating operation reads the whole collection, changes it in
//! memory and writes the whole collection back. The read-modify-write runs
//! under a per-collection mutex, so concurrent mutations of one collection
//! serialize instead of overwriting each other. Reads do not take the lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, TaskSyncError};

use super::backend::StorageBackend;
use super::hooks::{NoHooks, StoreHooks};
use super::id::generate_id;
use super::query::{Filter, Query};
use super::record::{to_object, Record};

/// Version of the persisted collection envelope.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Deserialize)]
struct CollectionDocument<T> {
    version: u32,
    items: Vec<T>,
}

#[derive(Serialize)]
struct CollectionDocumentRef<'a, T> {
    version: u32,
    items: &'a [T],
}

/// Outcome of [`PersistentStore::create_bulk`].
///
/// Invalid items do not block valid ones: `created` holds everything that
/// was persisted, `errors` the rejected input positions.
#[derive(Debug, Clone)]
pub struct BulkResult<T> {
    pub created: Vec<T>,
    pub errors: Vec<BulkItemError>,
}

impl<T> BulkResult<T> {
    /// Whether every input item was persisted.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A rejected item in a bulk create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    /// Position of the item in the input.
    pub index: usize,
    /// Why it was rejected.
    pub message: String,
}

/// A typed collection persisted through a [`StorageBackend`].
pub struct PersistentStore<T: Record> {
    collection: String,
    backend: Arc<dyn StorageBackend>,
    hooks: Box<dyn StoreHooks<T>>,
    write_lock: Mutex<()>,
}

impl<T: Record> PersistentStore<T> {
    /// Create a store for `collection` without hooks.
    pub fn new(collection: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_hooks(collection, backend, NoHooks)
    }

    /// Create a store for `collection` with validation/lifecycle hooks.
    pub fn with_hooks(
        collection: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        hooks: impl StoreHooks<T> + 'static,
    ) -> Self {
        Self {
            collection: collection.into(),
            backend,
            hooks: Box::new(hooks),
            write_lock: Mutex::new(()),
        }
    }

    /// The collection name (also the backend key).
    pub fn collection(&self) -> &str {
        &self.collection
    }

    // --- Reads ---

    /// All records, optionally filtered, sorted and sliced.
    pub fn get_all(&self, query: Option<&Query<T>>) -> Result<Vec<T>> {
        let items = self.load()?;
        Ok(match query {
            Some(q) => q.apply(items),
            None => items,
        })
    }

    /// The record with `id`, if present.
    pub fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load()?.into_iter().find(|i| i.id() == id))
    }

    /// The first record whose `field` equals `value`.
    pub fn get_by_field(&self, field: &str, value: impl Into<Value>) -> Result<Option<T>> {
        let filter = Filter::eq(field, value);
        Ok(self.load()?.into_iter().find(|i| filter.matches(i)))
    }

    /// Every record whose `field` equals `value`, in storage order.
    pub fn get_all_by_field(&self, field: &str, value: impl Into<Value>) -> Result<Vec<T>> {
        let filter = Filter::eq(field, value);
        Ok(self
            .load()?
            .into_iter()
            .filter(|i| filter.matches(i))
            .collect())
    }

    /// Number of records, optionally restricted by a filter.
    pub fn count(&self, filter: Option<&Filter<T>>) -> Result<usize> {
        let items = self.load()?;
        Ok(match filter {
            Some(f) => items.iter().filter(|i| f.matches(i)).count(),
            None => items.len(),
        })
    }

    /// Whether a record with `id` exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|i| i.id() == id))
    }

    // --- Writes ---

    /// Persist a new record.
    ///
    /// Assigns an ID when the item has none, stamps both timestamps and runs
    /// the `validate` hook. A caller-supplied ID that already exists is
    /// rejected as a validation error.
    pub fn create(&self, item: T) -> Result<T> {
        let created = {
            let _guard = self.lock();
            let mut items = self.load()?;
            let item = self
                .prepare_new(item, &items, Utc::now())
                .map_err(|m| self.validation(m))?;
            items.push(item.clone());
            self.save(&items)?;
            item
        };

        tracing::debug!("Created {} record {}", self.collection, created.id());
        self.hooks.after_create(&created);
        Ok(created)
    }

    /// Persist many new records in one write.
    ///
    /// Each item is validated independently; rejected items are reported by
    /// input index and do not prevent the valid ones from being stored.
    pub fn create_bulk(&self, new_items: Vec<T>) -> Result<BulkResult<T>> {
        let mut created = Vec::new();
        let mut errors = Vec::new();

        {
            let _guard = self.lock();
            let mut items = self.load()?;
            let now = Utc::now();

            for (index, item) in new_items.into_iter().enumerate() {
                match self.prepare_new(item, &items, now) {
                    Ok(item) => {
                        items.push(item.clone());
                        created.push(item);
                    }
                    Err(message) => errors.push(BulkItemError { index, message }),
                }
            }

            if !created.is_empty() {
                self.save(&items)?;
            }
        }

        tracing::debug!(
            "Bulk created {} {} records ({} rejected)",
            created.len(),
            self.collection,
            errors.len()
        );
        for item in &created {
            self.hooks.after_create(item);
        }

        Ok(BulkResult { created, errors })
    }

    /// Replace the record `id` wholesale.
    ///
    /// The stored ID and `createdAt` are kept; `updatedAt` is refreshed.
    pub fn put(&self, id: &str, item: T) -> Result<T> {
        self.modify(id, |existing, now| {
            let mut item = item;
            Self::carry_identity(existing, &mut item, now);
            Ok(item)
        })
    }

    /// Shallow-merge `partial` (a JSON object) into the record `id`.
    ///
    /// `id` and `createdAt` keys in the patch are ignored.
    pub fn patch(&self, id: &str, partial: Value) -> Result<T> {
        let Value::Object(partial) = partial else {
            return Err(self.validation("patch must be a JSON object".to_string()));
        };

        self.modify(id, |existing, now| {
            let mut merged = to_object(existing);
            for (key, value) in partial {
                if key == "id" || key == "createdAt" {
                    continue;
                }
                merged.insert(key, value);
            }

            let mut item: T = serde_json::from_value(Value::Object(merged))
                .map_err(|e| format!("patch produces an invalid record: {}", e))?;
            Self::carry_identity(existing, &mut item, now);
            Ok(item)
        })
    }

    /// Apply a typed in-place change to the record `id`.
    pub fn update_with(&self, id: &str, change: impl FnOnce(&mut T)) -> Result<T> {
        self.modify(id, |existing, now| {
            let mut item = existing.clone();
            change(&mut item);
            Self::carry_identity(existing, &mut item, now);
            Ok(item)
        })
    }

    /// Apply a bookkeeping change to every listed record in one write.
    ///
    /// `change` returns whether it modified the record; declined records keep
    /// their `updatedAt` and do not reach the `after_update` hook. IDs that do
    /// not exist are skipped. The `validate` hook is not run: this is for
    /// internal state such as sync status, not user payloads.
    /// Returns the updated records in storage order.
    pub fn update_many(
        &self,
        ids: &[String],
        mut change: impl FnMut(&mut T) -> bool,
    ) -> Result<Vec<T>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut updated = Vec::new();

        {
            let _guard = self.lock();
            let mut items = self.load()?;
            let now = Utc::now();

            for item in items.iter_mut() {
                if !wanted.contains(item.id()) {
                    continue;
                }
                let before = item.clone();
                if !change(item) {
                    *item = before;
                    continue;
                }
                Self::carry_identity(&before, item, now);
                updated.push(item.clone());
            }

            if !updated.is_empty() {
                self.save(&items)?;
            }
        }

        for item in &updated {
            self.hooks.after_update(item);
        }
        Ok(updated)
    }

    /// Remove the record `id`, returning it.
    pub fn delete(&self, id: &str) -> Result<T> {
        let removed = {
            let _guard = self.lock();
            let mut items = self.load()?;
            let pos = items
                .iter()
                .position(|i| i.id() == id)
                .ok_or_else(|| self.not_found(id))?;
            let removed = items.remove(pos);
            self.save(&items)?;
            removed
        };

        tracing::debug!("Deleted {} record {}", self.collection, id);
        self.hooks.after_delete(&removed);
        Ok(removed)
    }

    /// Remove every listed record. Unknown IDs are skipped.
    pub fn delete_bulk<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize> {
        let wanted: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        self.remove_matching(|item| wanted.contains(item.id()))
    }

    /// Remove every record matching `filter`.
    pub fn delete_where(&self, filter: &Filter<T>) -> Result<usize> {
        self.remove_matching(|item| filter.matches(item))
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<usize> {
        self.remove_matching(|_| true)
    }

    // --- Internals ---

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data of its own; a poisoned lock is reusable.
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> Result<Vec<T>> {
        let Some(raw) = self.backend.read(&self.collection)? else {
            return Ok(Vec::new());
        };

        let doc: CollectionDocument<T> =
            serde_json::from_str(&raw).map_err(|e| TaskSyncError::Storage {
                key: self.collection.clone(),
                message: format!("corrupt collection document: {}", e),
            })?;

        if doc.version > SCHEMA_VERSION {
            return Err(TaskSyncError::Storage {
                key: self.collection.clone(),
                message: format!(
                    "unsupported schema version {} (this build reads up to {})",
                    doc.version, SCHEMA_VERSION
                ),
            });
        }

        Ok(doc.items)
    }

    fn save(&self, items: &[T]) -> Result<()> {
        let doc = CollectionDocumentRef {
            version: SCHEMA_VERSION,
            items,
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|e| TaskSyncError::Storage {
            key: self.collection.clone(),
            message: format!("failed to serialize collection: {}", e),
        })?;
        self.backend.write(&self.collection, &json)
    }

    fn prepare_new(
        &self,
        mut item: T,
        existing: &[T],
        now: DateTime<Utc>,
    ) -> std::result::Result<T, String> {
        if item.id().is_empty() {
            let mut id = generate_id();
            while existing.iter().any(|i| i.id() == id) {
                id = generate_id();
            }
            item.meta_mut().id = id;
        } else if existing.iter().any(|i| i.id() == item.id()) {
            return Err(format!("duplicate id '{}'", item.id()));
        }

        let meta = item.meta_mut();
        meta.created_at = now;
        meta.updated_at = now;

        self.hooks.validate(&item)?;
        Ok(item)
    }

    /// Locked read-modify-write of a single existing record.
    fn modify(
        &self,
        id: &str,
        build: impl FnOnce(&T, DateTime<Utc>) -> std::result::Result<T, String>,
    ) -> Result<T> {
        let updated = {
            let _guard = self.lock();
            let mut items = self.load()?;
            let pos = items
                .iter()
                .position(|i| i.id() == id)
                .ok_or_else(|| self.not_found(id))?;

            let item = build(&items[pos], Utc::now()).map_err(|m| self.validation(m))?;
            self.hooks.validate(&item).map_err(|m| self.validation(m))?;

            items[pos] = item.clone();
            self.save(&items)?;
            item
        };

        tracing::debug!("Updated {} record {}", self.collection, id);
        self.hooks.after_update(&updated);
        Ok(updated)
    }

    fn remove_matching(&self, mut pred: impl FnMut(&T) -> bool) -> Result<usize> {
        let removed: Vec<T> = {
            let _guard = self.lock();
            let items = self.load()?;
            let (removed, kept): (Vec<T>, Vec<T>) = items.into_iter().partition(|i| pred(i));
            if !removed.is_empty() {
                self.save(&kept)?;
            }
            removed
        };

        if !removed.is_empty() {
            tracing::debug!("Removed {} {} records", removed.len(), self.collection);
        }
        for item in &removed {
            self.hooks.after_delete(item);
        }
        Ok(removed.len())
    }

    fn carry_identity(existing: &T, item: &mut T, now: DateTime<Utc>) {
        let meta = item.meta_mut();
        meta.id = existing.meta().id.clone();
        meta.created_at = existing.meta().created_at;
        meta.updated_at = now;
    }

    fn validation(&self, message: String) -> TaskSyncError {
        TaskSyncError::Validation {
            collection: self.collection.clone(),
            message,
        }
    }

    fn not_found(&self, id: &str) -> TaskSyncError {
        TaskSyncError::NotFound {
            collection: self.collection.clone(),
            id: id.to_string(),
        }
    }
}
