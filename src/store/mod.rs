//! Generic typed persistence.
//!
//! A [`PersistentStore`] owns one named collection of [`Record`]s and
//! persists it through a [`StorageBackend`]. Reads support equality and
//! predicate filters, ordering and pagination via [`Query`].

pub mod backend;
pub mod collection;
pub mod hooks;
pub mod id;
pub mod query;
pub mod record;

pub use backend::{open_backend, BackendKind, FileBackend, MemoryBackend, StorageBackend};
pub use collection::{BulkItemError, BulkResult, PersistentStore, SCHEMA_VERSION};
pub use hooks::{NoHooks, StoreHooks};
pub use id::generate_id;
pub use query::{compare_values, Filter, OrderBy, Query, SortOrder};
pub use record::{field_value, to_object, Record, RecordMeta};
