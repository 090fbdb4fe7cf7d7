//! Per-entity validation rules, plugged into the stores as hooks.

use std::collections::HashSet;

use crate::records::{Evidence, Project, Task};
use crate::store::StoreHooks;

/// Longest accepted title or name.
pub const MAX_TITLE_LEN: usize = 200;

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if value.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "{} must be at most {} characters",
            field, MAX_TITLE_LEN
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectRules;

impl StoreHooks<Project> for ProjectRules {
    fn validate(&self, item: &Project) -> Result<(), String> {
        require_text("name", &item.name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRules;

impl StoreHooks<Task> for TaskRules {
    fn validate(&self, item: &Task) -> Result<(), String> {
        require_text("title", &item.title)?;
        if item.project_id.trim().is_empty() {
            return Err("projectId must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for id in &item.evidence_ids {
            if !seen.insert(id) {
                return Err(format!("evidence '{}' is attached twice", id));
            }
        }
        Ok(())
    }

    fn after_create(&self, item: &Task) {
        tracing::debug!("Task {} created in project {}", item.meta.id, item.project_id);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceRules;

impl StoreHooks<Evidence> for EvidenceRules {
    fn validate(&self, item: &Evidence) -> Result<(), String> {
        if item.task_id.trim().is_empty() {
            return Err("taskId must not be empty".to_string());
        }
        require_text("fileName", &item.file_name)?;
        if item.file.uri.trim().is_empty() {
            return Err("file uri must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EvidenceKind, FileRef};

    #[test]
    fn task_requires_title_and_project() {
        assert!(TaskRules.validate(&Task::new("p1", "ok")).is_ok());
        assert!(TaskRules.validate(&Task::new("p1", "   ")).is_err());
        assert!(TaskRules.validate(&Task::new("", "ok")).is_err());
    }

    #[test]
    fn task_rejects_long_title() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        let err = TaskRules.validate(&Task::new("p1", title)).unwrap_err();
        assert!(err.contains("at most"));
    }

    #[test]
    fn task_rejects_duplicate_evidence() {
        let mut task = Task::new("p1", "ok");
        task.evidence_ids = vec!["e1".to_string(), "e1".to_string()];
        assert!(TaskRules.validate(&task).is_err());
    }

    #[test]
    fn evidence_requires_file() {
        let good = Evidence::new("t1", EvidenceKind::Photo, "a.jpg", FileRef::new("file:///a.jpg", 1));
        assert!(EvidenceRules.validate(&good).is_ok());

        let bad = Evidence::new("t1", EvidenceKind::Photo, "a.jpg", FileRef::new("", 1));
        assert!(EvidenceRules.validate(&bad).is_err());
    }

    #[test]
    fn project_requires_name() {
        assert!(ProjectRules.validate(&Project::new("Site A")).is_ok());
        assert!(ProjectRules.validate(&Project::new("")).is_err());
    }
}
