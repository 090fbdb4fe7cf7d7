//! The remote sync transport seam.
//!
//! A transport takes one batch of dirty records and reports a per-record
//! outcome. Returning `Err` means the whole batch failed.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Result, TaskSyncError};
use crate::records::{Evidence, RecordKind, Task};
use crate::store::Record;

/// Records submitted in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncBatch {
    pub tasks: Vec<Task>,
    pub evidence: Vec<Evidence>,
}

impl SyncBatch {
    pub fn len(&self) -> usize {
        self.tasks.len() + self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.evidence.is_empty()
    }

    /// `(kind, id)` of every record, tasks first, in submission order.
    pub fn keys(&self) -> Vec<(RecordKind, String)> {
        self.tasks
            .iter()
            .map(|t| (RecordKind::Task, t.id().to_string()))
            .chain(
                self.evidence
                    .iter()
                    .map(|e| (RecordKind::Evidence, e.id().to_string())),
            )
            .collect()
    }

    /// Split into batches of at most `size` records, tasks first.
    pub fn chunks(&self, size: usize) -> Vec<SyncBatch> {
        let size = size.max(1);
        let mut chunks = Vec::new();
        let mut current = SyncBatch::default();

        for task in &self.tasks {
            if current.len() == size {
                chunks.push(std::mem::take(&mut current));
            }
            current.tasks.push(task.clone());
        }
        for evidence in &self.evidence {
            if current.len() == size {
                chunks.push(std::mem::take(&mut current));
            }
            current.evidence.push(evidence.clone());
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// The remote's verdict on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub kind: RecordKind,
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordOutcome {
    pub fn ok(kind: RecordKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            success: true,
            message: None,
        }
    }

    pub fn failed(kind: RecordKind, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn key(&self) -> (RecordKind, String) {
        (self.kind, self.id.clone())
    }
}

/// Moves a batch of dirty records to the remote system of record.
pub trait SyncTransport: Send + Sync {
    /// Push `batch`, returning outcomes in the remote's order.
    ///
    /// Outcomes need not echo submission order; the caller correlates by
    /// `(kind, id)`.
    fn push(&self, batch: &SyncBatch) -> Result<Vec<RecordOutcome>>;

    /// Short description for logs and status output.
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct SyncResponse {
    results: Vec<RecordOutcome>,
}

/// JSON-over-HTTP transport.
///
/// Posts `{ "tasks": [...], "evidence": [...] }` to `<endpoint>/sync` and
/// expects `{ "results": [...] }` back. Large batches are sent in chunks of
/// `batch_size`; a failing chunk fails only its own records.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    batch_size: usize,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Default number of records per request.
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tasksync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
            auth_token: None,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn sync_url(&self) -> String {
        format!("{}/sync", self.endpoint)
    }

    fn push_chunk(&self, chunk: &SyncBatch) -> anyhow::Result<Vec<RecordOutcome>> {
        let url = self.sync_url();
        let mut request = self.client.post(&url).json(chunk);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;
        if !response.status().is_success() {
            bail!("HTTP {} from {}", response.status(), url);
        }

        let body: SyncResponse = response
            .json()
            .with_context(|| format!("Invalid sync response from {}", url))?;

        // Only this chunk's records can be answered by this request.
        let sent: HashSet<(RecordKind, String)> = chunk.keys().into_iter().collect();
        Ok(body
            .results
            .into_iter()
            .filter(|o| sent.contains(&o.key()))
            .collect())
    }
}

impl SyncTransport for HttpTransport {
    fn push(&self, batch: &SyncBatch) -> Result<Vec<RecordOutcome>> {
        let chunks = batch.chunks(self.batch_size);
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut failed_chunks = 0;
        let mut last_error = String::new();

        for (n, chunk) in chunks.iter().enumerate() {
            match self.push_chunk(chunk) {
                Ok(results) => outcomes.extend(results),
                Err(e) => {
                    let message = format!("{:#}", e);
                    tracing::warn!(
                        "Sync request {}/{} ({} records) failed: {}",
                        n + 1,
                        chunks.len(),
                        chunk.len(),
                        message
                    );
                    outcomes.extend(
                        chunk
                            .keys()
                            .into_iter()
                            .map(|(kind, id)| RecordOutcome::failed(kind, id, message.clone())),
                    );
                    failed_chunks += 1;
                    last_error = message;
                }
            }
        }

        if !chunks.is_empty() && failed_chunks == chunks.len() {
            return Err(TaskSyncError::Transport {
                message: last_error,
            });
        }
        Ok(outcomes)
    }

    fn describe(&self) -> String {
        self.sync_url()
    }
}
