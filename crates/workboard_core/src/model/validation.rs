//! Input validation errors shared by every entity.

use crate::model::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-correctable input problems. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is missing or blank.
    MissingField(&'static str),
    /// An enumerated field carries a value outside its documented set.
    InvalidEnumValue {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },
    /// A task reference names a task owned by a different project.
    ProjectTaskMismatch {
        task_id: EntityId,
        task_project_id: EntityId,
        project_id: EntityId,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidEnumValue {
                field,
                value,
                expected,
            } => write!(
                f,
                "invalid value `{value}` for `{field}`; expected one of {}",
                expected.join("|")
            ),
            Self::ProjectTaskMismatch {
                task_id,
                task_project_id,
                project_id,
            } => write!(
                f,
                "task {task_id} belongs to project {task_project_id}, not project {project_id}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank required text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Same as [`require_text`] for optional patch fields; absent is fine.
pub(crate) fn require_text_if_present(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => require_text(field, value),
        None => Ok(()),
    }
}
