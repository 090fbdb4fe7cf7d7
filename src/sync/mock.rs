//! Scriptable transport for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::transport::{RecordOutcome, SyncBatch, SyncTransport};
use crate::error::{Result, TaskSyncError};
use crate::records::RecordKind;

type PushHook = Arc<dyn Fn(&SyncBatch) + Send + Sync>;

#[derive(Default)]
struct Script {
    record_failures: HashMap<(RecordKind, String), String>,
    omitted: HashSet<(RecordKind, String)>,
    batch_failure: Option<String>,
    reverse: bool,
    extra: Vec<RecordOutcome>,
    on_push: Option<PushHook>,
    calls: Vec<SyncBatch>,
}

/// A transport that succeeds for every record unless told otherwise.
///
/// Behavior can be changed between pushes; every pushed batch is recorded.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject one record with `message`.
    pub fn fail_record(&self, kind: RecordKind, id: &str, message: &str) {
        self.script()
            .record_failures
            .insert((kind, id.to_string()), message.to_string());
    }

    /// Stop rejecting a record.
    pub fn accept_record(&self, kind: RecordKind, id: &str) {
        self.script().record_failures.remove(&(kind, id.to_string()));
    }

    /// Fail every push as a whole with `message`.
    pub fn fail_batch(&self, message: &str) {
        self.script().batch_failure = Some(message.to_string());
    }

    pub fn clear_batch_failure(&self) {
        self.script().batch_failure = None;
    }

    /// Leave a record out of the response.
    pub fn omit_record(&self, kind: RecordKind, id: &str) {
        self.script().omitted.insert((kind, id.to_string()));
    }

    /// Answer in reverse submission order.
    pub fn respond_in_reverse(&self) {
        self.script().reverse = true;
    }

    /// Append an outcome to every response, e.g. for an unknown record.
    pub fn inject_outcome(&self, outcome: RecordOutcome) {
        self.script().extra.push(outcome);
    }

    /// Run `hook` on every push before responding.
    pub fn on_push(&self, hook: impl Fn(&SyncBatch) + Send + Sync + 'static) {
        self.script().on_push = Some(Arc::new(hook));
    }

    /// Every batch pushed so far.
    pub fn calls(&self) -> Vec<SyncBatch> {
        self.script().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }
}

impl SyncTransport for MockTransport {
    fn push(&self, batch: &SyncBatch) -> Result<Vec<RecordOutcome>> {
        let (hook, response) = {
            let mut script = self.script();
            script.calls.push(batch.clone());

            let response = match &script.batch_failure {
                Some(message) => Err(TaskSyncError::Transport {
                    message: message.clone(),
                }),
                None => {
                    let mut outcomes: Vec<RecordOutcome> = batch
                        .keys()
                        .into_iter()
                        .filter(|key| !script.omitted.contains(key))
                        .map(|(kind, id)| match script.record_failures.get(&(kind, id.clone())) {
                            Some(message) => RecordOutcome::failed(kind, id, message.clone()),
                            None => RecordOutcome::ok(kind, id),
                        })
                        .collect();
                    if script.reverse {
                        outcomes.reverse();
                    }
                    outcomes.extend(script.extra.iter().cloned());
                    Ok(outcomes)
                }
            };
            (script.on_push.clone(), response)
        };

        // The hook may block or call back into the transport.
        if let Some(hook) = hook {
            hook(batch);
        }
        response
    }

    fn describe(&self) -> String {
        "mock transport".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Task;
    use crate::store::RecordMeta;

    fn batch(ids: &[&str]) -> SyncBatch {
        SyncBatch {
            tasks: ids
                .iter()
                .map(|id| {
                    let mut task = Task::new("p1", "t");
                    task.meta = RecordMeta::with_id(*id);
                    task
                })
                .collect(),
            evidence: Vec::new(),
        }
    }

    #[test]
    fn succeeds_by_default_and_records_calls() {
        let transport = MockTransport::new();
        let outcomes = transport.push(&batch(&["a", "b"])).unwrap();

        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.calls()[0].len(), 2);
    }

    #[test]
    fn scripted_failures_and_omissions() {
        let transport = MockTransport::new();
        transport.fail_record(RecordKind::Task, "a", "conflict");
        transport.omit_record(RecordKind::Task, "c");
        transport.respond_in_reverse();

        let outcomes = transport.push(&batch(&["a", "b", "c"])).unwrap();

        assert_eq!(
            outcomes,
            vec![
                RecordOutcome::ok(RecordKind::Task, "b"),
                RecordOutcome::failed(RecordKind::Task, "a", "conflict"),
            ]
        );

        transport.accept_record(RecordKind::Task, "a");
        assert!(transport.push(&batch(&["a"])).unwrap()[0].success);
    }

    #[test]
    fn batch_failure_is_transport_error() {
        let transport = MockTransport::new();
        transport.fail_batch("offline upstream");
        assert!(transport.push(&batch(&["a"])).unwrap_err().is_retryable());

        transport.clear_batch_failure();
        assert!(transport.push(&batch(&["a"])).is_ok());
    }

    #[test]
    fn hook_runs_on_push() {
        let transport = MockTransport::new();
        let seen = Arc::new(Mutex::new(0));
        let s = seen.clone();
        transport.on_push(move |b| *s.lock().unwrap() += b.len());

        transport.push(&batch(&["a", "b"])).unwrap();
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
