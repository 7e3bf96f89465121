//! Task and task-note records.
//!
//! # Invariants
//! - `project_id` is required at creation and immutable afterwards.
//! - Task notes belong to exactly one task and list oldest first.

use crate::model::enums::{TaskPriority, TaskStatus, TaskType};
use crate::model::validation::{require_text, require_text_if_present, ValidationError};
use crate::model::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub project_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub external_link: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input. Omitted enumerations take their documented defaults
/// (`general`, `pending`, `medium`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub project_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub external_link: Option<String>,
}

impl NewTask {
    pub fn new(project_id: EntityId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            task_type: None,
            status: None,
            priority: None,
            external_link: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

/// Sparse update. There is deliberately no `project_id` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub external_link: Option<String>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text_if_present("title", self.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_id: Option<EntityId>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub priority: Option<TaskPriority>,
    pub limit: Option<u32>,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNote {
    pub id: EntityId,
    pub task_id: EntityId,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}
