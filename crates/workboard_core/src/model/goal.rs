//! Goal records. Link rules mirror [`crate::model::problem`].

use crate::model::enums::GoalType;
use crate::model::validation::{require_text, require_text_if_present, ValidationError};
use crate::model::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: EntityId,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub assignee: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input. `goal_type` defaults to `short_term`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub description: Option<String>,
    pub goal_type: Option<GoalType>,
    pub assignee: Option<String>,
}

impl NewGoal {
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
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_type: Option<GoalType>,
    pub assignee: Option<String>,
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
}

impl GoalPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text_if_present("title", self.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalFilter {
    pub project_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub goal_type: Option<GoalType>,
    pub assignee: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}
