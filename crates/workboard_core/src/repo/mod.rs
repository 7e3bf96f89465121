//! Repository layer: entity stores plus the referential integrity engine.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every write runs its integrity checks and the write itself in one
//!   IMMEDIATE transaction; a failed check leaves no partial row.
//! - Repository APIs return semantic errors (`Validation`, `Reference`,
//!   `NotFound`) in addition to DB transport errors.
//! - Repositories never publish change events.

pub mod error;
pub mod goal_repo;
pub(crate) mod integrity;
pub mod link_repo;
pub mod outcome_repo;
pub mod problem_repo;
pub mod project_repo;
pub(crate) mod sql;
pub mod task_repo;
