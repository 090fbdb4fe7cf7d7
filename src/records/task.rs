//! Task record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::sync_fields::{RecordKind, SyncFields, Syncable};
use crate::store::{Record, RecordMeta};

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// A unit of work inside a project.
///
/// `project_id` is informational; deleting a project does not cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Attached evidence, in attachment order.
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    #[serde(flatten)]
    pub sync: SyncFields,
}

impl Task {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            project_id: project_id.into(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            due_date: None,
            evidence_ids: Vec::new(),
            sync: SyncFields::pending(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl Record for Task {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl Syncable for Task {
    const KIND: RecordKind = RecordKind::Task;

    fn sync_fields(&self) -> &SyncFields {
        &self.sync
    }

    fn sync_fields_mut(&mut self) -> &mut SyncFields {
        &mut self.sync
    }
}
