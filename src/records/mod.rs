//! Domain records: projects, tasks and evidence.

pub mod evidence;
pub mod project;
pub mod sync_fields;
pub mod task;

pub use evidence::{Evidence, EvidenceKind, FileRef};
pub use project::Project;
pub use sync_fields::{RecordKind, SyncFields, SyncStatus, Syncable};
pub use task::{Task, TaskStatus};
