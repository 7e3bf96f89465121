//! Project records: the ownership root for tasks and outcomes.

use crate::model::enums::ProjectStatus;
use crate::model::validation::{require_text, require_text_if_present, ValidationError};
use crate::model::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub external_link: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input. `status` defaults to `active`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub external_link: Option<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

/// Sparse update; only `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub external_link: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text_if_present("name", self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}
