//! Orchestration runs.
//!
//! A run selects the dirty records, marks them `syncing`, pushes them as one
//! logical batch, correlates the outcomes by `(kind, id)` and applies them.
//! At most one run is in flight per orchestrator.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use super::connectivity::{ConnectivityMonitor, Subscription};
use super::status::{SyncResult, SyncStatusData};
use super::tracker::{Resolution, SyncStateTracker};
use super::transport::{RecordOutcome, SyncBatch, SyncTransport};
use crate::error::{Result, TaskSyncError};
use crate::records::RecordKind;
use crate::repository::{Repositories, SyncRunRecord, SyncTrigger};

/// Reason recorded for a submitted record the transport did not answer.
pub const MISSING_OUTCOME: &str = "no result returned by transport";

/// Clears the in-flight flag when dropped, including on early returns.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives synchronization between the repositories and a transport.
pub struct SyncOrchestrator {
    repos: Arc<Repositories>,
    transport: Arc<dyn SyncTransport>,
    online: AtomicBool,
    in_flight: AtomicBool,
    auto_sync_on_reconnect: bool,
}

impl SyncOrchestrator {
    pub fn new(
        repos: Arc<Repositories>,
        transport: Arc<dyn SyncTransport>,
        initially_online: bool,
    ) -> Self {
        Self {
            repos,
            transport,
            online: AtomicBool::new(initially_online),
            in_flight: AtomicBool::new(false),
            auto_sync_on_reconnect: true,
        }
    }

    /// Whether an offline-to-online transition starts a run.
    pub fn with_auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync_on_reconnect = enabled;
        self
    }

    pub fn repositories(&self) -> &Arc<Repositories> {
        &self.repos
    }

    pub fn transport(&self) -> &Arc<dyn SyncTransport> {
        &self.transport
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The aggregate snapshot.
    pub fn get_sync_status_data(&self) -> Result<SyncStatusData> {
        SyncStateTracker::new(&self.repos).snapshot(self.is_online(), self.is_syncing())
    }

    /// Run synchronization now.
    ///
    /// Refused with [`TaskSyncError::Offline`] while offline and with
    /// [`TaskSyncError::SyncInProgress`] while another run is in flight.
    pub fn manual_sync(&self) -> Result<SyncResult> {
        if !self.is_online() {
            return Err(TaskSyncError::Offline);
        }
        self.run(SyncTrigger::Manual)
    }

    /// Record a connectivity state. Same as [`handle_connectivity_change`](Self::handle_connectivity_change).
    pub fn set_online(&self, online: bool) -> Option<Result<SyncResult>> {
        self.handle_connectivity_change(online)
    }

    /// React to a connectivity report.
    ///
    /// On an offline-to-online transition with auto-sync enabled, runs once
    /// and returns the run's result. Returns `None` when no run was started,
    /// including when one is already in flight.
    pub fn handle_connectivity_change(&self, online: bool) -> Option<Result<SyncResult>> {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        if !online {
            tracing::info!("Went offline; sync paused");
            return None;
        }

        tracing::info!("Back online");
        if !self.auto_sync_on_reconnect {
            return None;
        }

        match self.run(SyncTrigger::Reconnect) {
            Err(TaskSyncError::SyncInProgress) => {
                tracing::warn!("Reconnect sync skipped: a run is already in progress");
                None
            }
            other => Some(other),
        }
    }

    /// Follow `monitor`: adopt its current state and react to transitions.
    ///
    /// The orchestrator is held weakly; the returned subscription stops
    /// delivery when dropped.
    pub fn attach(self: &Arc<Self>, monitor: &dyn ConnectivityMonitor) -> Subscription {
        self.online.store(monitor.fetch_current(), Ordering::Release);

        let weak: Weak<Self> = Arc::downgrade(self);
        monitor.subscribe(Arc::new(move |online| {
            let Some(orchestrator) = weak.upgrade() else {
                return;
            };
            match orchestrator.handle_connectivity_change(online) {
                Some(Ok(result)) => log_result(SyncTrigger::Reconnect, &result),
                Some(Err(e)) => tracing::warn!("Reconnect sync failed: {}", e),
                None => {}
            }
        }))
    }

    fn run(&self, trigger: SyncTrigger) -> Result<SyncResult> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(TaskSyncError::SyncInProgress)?;

        let started_at = Utc::now();
        let timer = Instant::now();
        let tracker = SyncStateTracker::new(&self.repos);

        let selection = tracker.select_dirty()?;
        if selection.is_empty() {
            tracing::info!("Nothing to sync");
            return Ok(SyncResult::nothing_to_sync());
        }

        tracing::info!(
            "Starting {} sync: {} tasks, {} evidence via {}",
            trigger,
            selection.tasks.len(),
            selection.evidence.len(),
            self.transport.describe()
        );

        let submitted = selection.keys();
        self.push_marked(trigger, &tracker, &selection, started_at, timer)
            .map_err(|e| {
                tracing::error!("{} sync aborted: {}", trigger, e);
                let released = tracker.release(&submitted, &e.to_string());
                if released > 0 {
                    tracing::warn!("Marked {} in-flight records as failed", released);
                }
                e
            })
    }

    /// Everything after selection: mark, push, resolve, record the run.
    ///
    /// Any error returned here may leave records in `syncing`; the caller
    /// releases them.
    fn push_marked(
        &self,
        trigger: SyncTrigger,
        tracker: &SyncStateTracker<'_>,
        selection: &SyncBatch,
        started_at: DateTime<Utc>,
        timer: Instant,
    ) -> Result<SyncResult> {
        let batch = tracker.mark_syncing(selection)?;
        let submitted = batch.keys();

        let mut errors = Vec::new();
        let resolutions = match self.transport.push(&batch) {
            Ok(outcomes) => correlate(&submitted, outcomes, &mut errors),
            Err(e) => {
                let message = match &e {
                    TaskSyncError::Transport { message } => message.clone(),
                    other => other.to_string(),
                };
                tracing::warn!("Sync batch failed: {}", message);
                errors.push(message.clone());
                submitted
                    .into_iter()
                    .map(|(kind, id)| (kind, id, Resolution::Failed(message.clone())))
                    .collect()
            }
        };

        let finished_at = Utc::now();
        let applied = tracker.apply(&resolutions, finished_at)?;

        let failed = applied.failed_tasks + applied.failed_evidence;
        let result = SyncResult {
            success: failed == 0 && errors.is_empty(),
            nothing_to_sync: false,
            synced_tasks: applied.synced_tasks,
            synced_evidence: applied.synced_evidence,
            failed_tasks: applied.failed_tasks,
            failed_evidence: applied.failed_evidence,
            errors,
        };

        self.repos.queue.record_run(
            finished_at,
            SyncRunRecord {
                started_at,
                duration_ms: timer.elapsed().as_millis() as u64,
                trigger,
                success: result.success,
                synced_tasks: result.synced_tasks,
                synced_evidence: result.synced_evidence,
                failed_tasks: result.failed_tasks,
                failed_evidence: result.failed_evidence,
                errors: result.errors.clone(),
            },
        )?;

        log_result(trigger, &result);
        Ok(result)
    }
}

/// Turn transport outcomes into one verdict per submitted record.
///
/// Outcomes are taken in response order; a later outcome for the same
/// record replaces an earlier one. Outcomes for records that were not
/// submitted are ignored. Submitted records without an outcome fail with
/// [`MISSING_OUTCOME`]. Per-record failure messages are appended to
/// `errors`.
fn correlate(
    submitted: &[(RecordKind, String)],
    outcomes: Vec<RecordOutcome>,
    errors: &mut Vec<String>,
) -> Vec<(RecordKind, String, Resolution)> {
    let expected: HashSet<&(RecordKind, String)> = submitted.iter().collect();
    let mut order: Vec<(RecordKind, String)> = Vec::new();
    let mut verdicts: HashMap<(RecordKind, String), Resolution> = HashMap::new();

    for outcome in outcomes {
        let key = outcome.key();
        if !expected.contains(&key) {
            tracing::warn!(
                "Ignoring outcome for {} {} which was not submitted",
                outcome.kind,
                outcome.id
            );
            continue;
        }

        let resolution = if outcome.success {
            Resolution::Synced
        } else {
            Resolution::Failed(
                outcome
                    .message
                    .unwrap_or_else(|| "rejected by remote".to_string()),
            )
        };
        if verdicts.insert(key.clone(), resolution).is_none() {
            order.push(key);
        }
    }

    for key in submitted {
        if !verdicts.contains_key(key) {
            tracing::warn!("{} {}: {}", key.0, key.1, MISSING_OUTCOME);
            verdicts.insert(key.clone(), Resolution::Failed(MISSING_OUTCOME.to_string()));
            order.push(key.clone());
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let resolution = verdicts.remove(&key)?;
            if let Resolution::Failed(reason) = &resolution {
                errors.push(format!("{} {}: {}", key.0, key.1, reason));
            }
            Some((key.0, key.1, resolution))
        })
        .collect()
}

fn log_result(trigger: SyncTrigger, result: &SyncResult) {
    if result.nothing_to_sync {
        return;
    }
    if result.success {
        tracing::info!(
            "{} sync finished: {} records synced",
            trigger,
            result.synced_total()
        );
    } else {
        tracing::warn!(
            "{} sync finished with failures: {} synced, {} failed",
            trigger,
            result.synced_total(),
            result.failed_total()
        );
    }
}
