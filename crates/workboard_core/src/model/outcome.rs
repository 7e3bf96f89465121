//! Outcome records: owned by one project, optionally tied to one of its tasks.

use crate::model::enums::OutcomeStatus;
use crate::model::validation::{require_text, require_text_if_present, ValidationError};
use crate::model::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: EntityId,
    pub project_id: EntityId,
    pub task_id: Option<EntityId>,
    pub title: String,
    pub description: Option<String>,
    pub status: OutcomeStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutcome {
    pub project_id: EntityId,
    pub title: String,
    pub task_id: Option<EntityId>,
    pub description: Option<String>,
    pub status: Option<OutcomeStatus>,
}

impl NewOutcome {
    pub fn new(project_id: EntityId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            task_id: None,
            description: None,
            status: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

/// Sparse update. `task_id`, when given, must name a task of the outcome's
/// project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<OutcomeStatus>,
    pub task_id: Option<EntityId>,
}

impl OutcomePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text_if_present("title", self.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeFilter {
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub status: Option<OutcomeStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}
