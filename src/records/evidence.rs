//! Evidence record and its file reference.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::sync_fields::{RecordKind, SyncFields, Syncable};
use crate::store::{Record, RecordMeta};

/// What kind of artifact the evidence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    #[default]
    Photo,
    Document,
}

impl EvidenceKind {
    /// Guess the kind from a file extension. Images are photos.
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg" | "jpeg" | "png" | "heic" | "gif" | "webp") => Self::Photo,
            _ => Self::Document,
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => f.write_str("photo"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// Opaque handle to a local file. The engine never reads the contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub uri: String,
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(uri: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            uri: uri.into(),
            size_bytes,
        }
    }

    /// Reference an existing local file as a `file://` URI.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let canonical = path
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", path.display()))?;
        let metadata = std::fs::metadata(&canonical)
            .with_context(|| format!("Cannot stat {}", canonical.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", canonical.display());
        }

        Ok(Self {
            uri: format!("file://{}", canonical.display()),
            size_bytes: metadata.len(),
        })
    }
}

/// A photo or document attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub task_id: String,
    pub kind: EvidenceKind,
    pub file_name: String,
    pub file: FileRef,
    pub uploaded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub sync: SyncFields,
}

impl Evidence {
    pub fn new(
        task_id: impl Into<String>,
        kind: EvidenceKind,
        file_name: impl Into<String>,
        file: FileRef,
    ) -> Self {
        Self {
            meta: RecordMeta::new(),
            task_id: task_id.into(),
            kind,
            file_name: file_name.into(),
            file,
            uploaded_at: Utc::now(),
            sync: SyncFields::pending(),
        }
    }
}

impl Record for Evidence {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl Syncable for Evidence {
    const KIND: RecordKind = RecordKind::Evidence;

    fn sync_fields(&self) -> &SyncFields {
        &self.sync
    }

    fn sync_fields_mut(&mut self) -> &mut SyncFields {
        &mut self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_ref_from_path_reports_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("receipt.pdf");
        std::fs::write(&path, b"12345").unwrap();

        let file = FileRef::from_path(&path).unwrap();
        assert!(file.uri.starts_with("file://"));
        assert!(file.uri.ends_with("receipt.pdf"));
        assert_eq!(file.size_bytes, 5);
    }

    #[test]
    fn file_ref_from_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let err = FileRef::from_path(&temp.path().join("nope.jpg")).unwrap_err();
        assert!(err.to_string().contains("Cannot resolve"));
    }

    #[test]
    fn file_ref_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = FileRef::from_path(temp.path()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(
            EvidenceKind::from_extension(Path::new("a/IMG_001.JPG")),
            EvidenceKind::Photo
        );
        assert_eq!(
            EvidenceKind::from_extension(Path::new("report.pdf")),
            EvidenceKind::Document
        );
        assert_eq!(
            EvidenceKind::from_extension(Path::new("README")),
            EvidenceKind::Document
        );
    }

    #[test]
    fn evidence_json_shape() {
        let evidence = Evidence::new(
            "t1",
            EvidenceKind::Photo,
            "roof.jpg",
            FileRef::new("file:///tmp/roof.jpg", 10),
        );
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json["taskId"], "t1");
        assert_eq!(json["kind"], "photo");
        assert_eq!(json["file"]["sizeBytes"], 10);
        assert_eq!(json["syncStatus"], "pending");
    }
}
