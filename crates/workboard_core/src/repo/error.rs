//! Repository error model shared by every entity repository.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::{EntityId, EntityKind, LinkKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-facing classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input must be corrected by the caller.
    Validation,
    /// A foreign key names an entity that does not exist.
    Reference,
    /// The targeted identity (or link) does not exist.
    NotFound,
    /// Storage transport or persisted-data failure.
    Storage,
}

/// Error returned by every store and integrity operation.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    /// A referenced parent row is missing.
    Reference { kind: EntityKind, id: EntityId },
    /// The operation target is missing.
    NotFound { kind: EntityKind, id: EntityId },
    /// `unlink` on a pair that was never linked.
    LinkNotFound {
        kind: LinkKind,
        child_id: EntityId,
        project_id: EntityId,
    },
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    Db(DbError),
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Reference { .. } => ErrorKind::Reference,
            Self::NotFound { .. } | Self::LinkNotFound { .. } => ErrorKind::NotFound,
            Self::UninitializedConnection { .. } | Self::Db(_) | Self::InvalidData(_) => {
                ErrorKind::Storage
            }
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn reference(kind: EntityKind, id: EntityId) -> Self {
        Self::Reference { kind, id }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Reference { kind, id } => write!(f, "referenced {kind} does not exist: {id}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::LinkNotFound {
                kind,
                child_id,
                project_id,
            } => write!(f, "{kind} {child_id} is not linked to project {project_id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Reference { .. }
            | Self::NotFound { .. }
            | Self::LinkNotFound { .. }
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
