//! tasksync - offline-first task and evidence tracking with batched sync.
//!
//! Projects, tasks and evidence are stored locally as JSON documents and
//! every local mutation marks the record dirty. A sync run pushes the dirty
//! working set to a remote endpoint in one batch and records a per-record
//! outcome; failures stay dirty and are retried on the next run.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Layered configuration loading and validation
//! - [`error`] - Error types and result aliases
//! - [`records`] - Record types and their sync bookkeeping
//! - [`repository`] - Validated per-kind access to the stores
//! - [`store`] - Generic record stores over a storage backend
//! - [`sync`] - Sync orchestration, transport and connectivity
//! - [`ui`] - Terminal output, tables and spinners
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tasksync::repository::{NewTask, Repositories};
//! use tasksync::store::Record;
//! use tasksync::sync::{MockTransport, SyncOrchestrator};
//!
//! let repos = Arc::new(Repositories::in_memory());
//! let project = repos.projects.create("Warehouse", "").unwrap();
//! repos.tasks.create(NewTask::new(project.id(), "Inspect roof")).unwrap();
//!
//! let orchestrator = SyncOrchestrator::new(repos, Arc::new(MockTransport::new()), true);
//! let result = orchestrator.manual_sync().unwrap();
//! assert!(result.success);
//! assert_eq!(result.synced_tasks, 1);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod records;
pub mod repository;
pub mod store;
pub mod sync;
pub mod ui;

pub use error::{Result, TaskSyncError};
