//! Synchronization engine.
//!
//! - [`tracker`] - per-record state transitions and aggregate counts
//! - [`orchestrator`] - batched runs, manual and connectivity-triggered
//! - [`transport`] - the remote transport seam and the HTTP implementation
//! - [`connectivity`] - online/offline monitoring seam
//! - [`mock`] - scriptable transport for tests

pub mod connectivity;
pub mod mock;
pub mod orchestrator;
pub mod status;
pub mod tracker;
pub mod transport;

pub use connectivity::{ConnectivityCallback, ConnectivityMonitor, ManualConnectivity, Subscription};
pub use mock::MockTransport;
pub use orchestrator::{SyncOrchestrator, MISSING_OUTCOME};
pub use status::{SyncResult, SyncStatusData};
pub use tracker::{AppliedCounts, Resolution, SyncCounts, SyncStateTracker};
pub use transport::{HttpTransport, RecordOutcome, SyncBatch, SyncTransport};
