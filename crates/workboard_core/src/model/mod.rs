//! Typed domain model for project-management entities.
//!
//! # Responsibility
//! - Define records, creation inputs, sparse patches and list filters.
//! - Keep the core API fully typed; untyped argument bags are parsed at the
//!   caller boundary through the `FromStr` impls in [`enums`].
//!
//! # Invariants
//! - Identities are assigned by storage, monotonic per table, never reused.
//! - Optional references are `Option<EntityId>`, never a zero sentinel.
//! - Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod enums;
pub mod goal;
pub mod outcome;
pub mod problem;
pub mod project;
pub mod task;
pub mod validation;

/// Numeric identity assigned by storage on creation.
pub type EntityId = i64;

/// Discriminates the six entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Task,
    TaskNote,
    Problem,
    Outcome,
    Goal,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::TaskNote => "task_note",
            Self::Problem => "problem",
            Self::Outcome => "outcome",
            Self::Goal => "goal",
        }
    }

    /// Backing table name.
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Task => "tasks",
            Self::TaskNote => "task_notes",
            Self::Problem => "problems",
            Self::Outcome => "outcomes",
            Self::Goal => "goals",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities that can carry additional many-to-many project links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Goal,
    Problem,
}

impl LinkKind {
    pub fn entity(self) -> EntityKind {
        match self {
            Self::Goal => EntityKind::Goal,
            Self::Problem => EntityKind::Problem,
        }
    }

    pub(crate) fn junction_table(self) -> &'static str {
        match self {
            Self::Goal => "goal_projects",
            Self::Problem => "problem_projects",
        }
    }

    pub(crate) fn child_column(self) -> &'static str {
        match self {
            Self::Goal => "goal_id",
            Self::Problem => "problem_id",
        }
    }
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entity().as_str())
    }
}
