//! Problem records.
//!
//! A problem may point at one origin project and/or one task; when both are
//! set the task must belong to that project. Further projects are attached
//! through `problem_projects` junction rows.

use crate::model::enums::ProblemStatus;
use crate::model::validation::{require_text, require_text_if_present, ValidationError};
use crate::model::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: EntityId,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub title: String,
    pub description: Option<String>,
    pub status: ProblemStatus,
    pub assignee: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input. When only `task_id` is given the project is inherited
/// from the task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProblem {
    pub title: String,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub description: Option<String>,
    pub status: Option<ProblemStatus>,
    pub assignee: Option<String>,
}

impl NewProblem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProblemStatus>,
    pub assignee: Option<String>,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
}

impl ProblemPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text_if_present("title", self.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemFilter {
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub status: Option<ProblemStatus>,
    pub assignee: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}
