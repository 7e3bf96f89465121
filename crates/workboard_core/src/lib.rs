//! Core domain logic for Workboard.
//!
//! Persistence and referential integrity for projects, tasks, task notes,
//! problems, outcomes and goals, plus the hub that republishes every
//! mutation to live subscribers.

pub mod config;
pub mod db;
pub mod hub;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, HubConfig, WorkboardConfig};
pub use hub::{
    spawn_heartbeat, ChangeAction, ChangeHub, HubMessage, PublishReport, Subscription,
    HEARTBEAT_EVENT,
};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::enums::{
    GoalType, OutcomeStatus, ProblemStatus, ProjectStatus, TaskPriority, TaskStatus, TaskType,
};
pub use model::goal::{Goal, GoalFilter, GoalPatch, NewGoal};
pub use model::outcome::{NewOutcome, Outcome, OutcomeFilter, OutcomePatch};
pub use model::problem::{NewProblem, Problem, ProblemFilter, ProblemPatch};
pub use model::project::{NewProject, Project, ProjectFilter, ProjectPatch};
pub use model::task::{NewTask, Task, TaskFilter, TaskNote, TaskPatch};
pub use model::validation::ValidationError;
pub use model::{EntityId, EntityKind, LinkKind};
pub use repo::error::{ErrorKind, StoreError, StoreResult};
pub use repo::goal_repo::{GoalRepository, SqliteGoalRepository};
pub use repo::link_repo::{LinkRepository, SqliteLinkRepository};
pub use repo::outcome_repo::{OutcomeRepository, SqliteOutcomeRepository};
pub use repo::problem_repo::{ProblemRepository, SqliteProblemRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use service::workboard_service::WorkboardService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
