//! The record abstraction shared by every stored entity.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity and timestamps carried by every record.
///
/// Flattened into each entity so the persisted JSON stays a single flat
/// object (`id`, `createdAt`, `updatedAt` next to the payload fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// Unique within its collection. Empty until the store assigns one.
    #[serde(default)]
    pub id: String,

    /// When the record was first persisted.
    pub created_at: DateTime<Utc>,

    /// When the record was last mutated, including sync bookkeeping.
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// Metadata for a record that has not been persisted yet.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Metadata with a caller-chosen ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new()
        }
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// An entity that can live in a [`PersistentStore`](super::PersistentStore).
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identity and timestamps.
    fn meta(&self) -> &RecordMeta;

    /// Mutable identity and timestamps.
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// The record's ID.
    fn id(&self) -> &str {
        &self.meta().id
    }
}

/// Serialize a record into its JSON object form.
///
/// Records that fail to serialize are treated as empty objects so that
/// field filters simply do not match them.
pub fn to_object<T: Record>(item: &T) -> serde_json::Map<String, Value> {
    match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

/// Read a single top-level field of a record, `Null` when absent.
pub fn field_value<T: Record>(item: &T, field: &str) -> Value {
    to_object(item).remove(field).unwrap_or(Value::Null)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record used by the store tests.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Note {
        #[serde(flatten)]
        pub meta: RecordMeta,
        pub title: String,
        #[serde(default)]
        pub priority: i64,
        #[serde(default)]
        pub done: bool,
    }

    impl Note {
        pub fn new(title: &str, priority: i64) -> Self {
            Self {
                meta: RecordMeta::new(),
                title: title.to_string(),
                priority,
                done: false,
            }
        }
    }

    impl Record for Note {
        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::Note;
    use super::*;

    #[test]
    fn meta_flattens_into_record() {
        let mut note = Note::new("hello", 2);
        note.meta.id = "n1".to_string();

        let obj = to_object(&note);
        assert_eq!(obj["id"], "n1");
        assert!(obj.contains_key("createdAt"));
        assert!(obj.contains_key("updatedAt"));
        assert_eq!(obj["title"], "hello");
    }

    #[test]
    fn field_value_missing_is_null() {
        let note = Note::new("hello", 2);
        assert_eq!(field_value(&note, "priority"), Value::from(2));
        assert_eq!(field_value(&note, "nope"), Value::Null);
    }

    #[test]
    fn missing_id_deserializes_as_empty() {
        let json = r#"{"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z","title":"x"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.id().is_empty());
    }
}
