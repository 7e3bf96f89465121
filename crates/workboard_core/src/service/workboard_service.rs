//! Mutation-then-publish facade over the entity repositories.
//!
//! # Responsibility
//! - Give in-process callers one entry point for every store operation.
//! - Publish a change event after each successful mutation.
//!
//! # Invariants
//! - Events are published only after the write committed; failed
//!   operations publish nothing.
//! - Reads never publish.
//! - Publishing never turns a successful mutation into an error.

use crate::hub::{change_event_type, ChangeAction, ChangeHub};
use crate::model::goal::{Goal, GoalFilter, GoalPatch, NewGoal};
use crate::model::outcome::{NewOutcome, Outcome, OutcomeFilter, OutcomePatch};
use crate::model::problem::{NewProblem, Problem, ProblemFilter, ProblemPatch};
use crate::model::project::{NewProject, Project, ProjectFilter, ProjectPatch};
use crate::model::task::{NewTask, Task, TaskFilter, TaskNote, TaskPatch};
use crate::model::{EntityId, EntityKind, LinkKind};
use crate::repo::error::StoreResult;
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::outcome_repo::{OutcomeRepository, SqliteOutcomeRepository};
use crate::repo::problem_repo::{ProblemRepository, SqliteProblemRepository};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;

/// Payload published for deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedPayload {
    pub id: EntityId,
}

/// Payload published for junction changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkPayload {
    pub kind: LinkKind,
    pub child_id: EntityId,
    pub project_id: EntityId,
}

pub struct WorkboardService<'conn> {
    projects: SqliteProjectRepository<'conn>,
    tasks: SqliteTaskRepository<'conn>,
    problems: SqliteProblemRepository<'conn>,
    outcomes: SqliteOutcomeRepository<'conn>,
    goals: SqliteGoalRepository<'conn>,
    links: SqliteLinkRepository<'conn>,
    hub: Arc<ChangeHub>,
}

impl<'conn> WorkboardService<'conn> {
    pub fn try_new(conn: &'conn Connection, hub: Arc<ChangeHub>) -> StoreResult<Self> {
        Ok(Self {
            projects: SqliteProjectRepository::try_new(conn)?,
            tasks: SqliteTaskRepository::try_new(conn)?,
            problems: SqliteProblemRepository::try_new(conn)?,
            outcomes: SqliteOutcomeRepository::try_new(conn)?,
            goals: SqliteGoalRepository::try_new(conn)?,
            links: SqliteLinkRepository::try_new(conn)?,
            hub,
        })
    }

    pub fn hub(&self) -> &Arc<ChangeHub> {
        &self.hub
    }

    // Projects

    pub fn create_project(&self, input: &NewProject) -> StoreResult<Project> {
        let project = self.projects.create_project(input)?;
        self.announce(EntityKind::Project, ChangeAction::Created, project.id, &project);
        Ok(project)
    }

    pub fn get_project(&self, id: EntityId) -> StoreResult<Project> {
        self.projects.get_project(id)
    }

    pub fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        self.projects.list_projects(filter)
    }

    pub fn update_project(&self, id: EntityId, patch: &ProjectPatch) -> StoreResult<Project> {
        let project = self.projects.update_project(id, patch)?;
        self.announce(EntityKind::Project, ChangeAction::Updated, id, &project);
        Ok(project)
    }

    pub fn delete_project(&self, id: EntityId) -> StoreResult<()> {
        self.projects.delete_project(id)?;
        self.announce_deleted(EntityKind::Project, id);
        Ok(())
    }

    // Tasks

    pub fn create_task(&self, input: &NewTask) -> StoreResult<Task> {
        let task = self.tasks.create_task(input)?;
        self.announce(EntityKind::Task, ChangeAction::Created, task.id, &task);
        Ok(task)
    }

    pub fn get_task(&self, id: EntityId) -> StoreResult<Task> {
        self.tasks.get_task(id)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        self.tasks.list_tasks(filter)
    }

    pub fn update_task(&self, id: EntityId, patch: &TaskPatch) -> StoreResult<Task> {
        let task = self.tasks.update_task(id, patch)?;
        self.announce(EntityKind::Task, ChangeAction::Updated, id, &task);
        Ok(task)
    }

    pub fn delete_task(&self, id: EntityId) -> StoreResult<()> {
        self.tasks.delete_task(id)?;
        self.announce_deleted(EntityKind::Task, id);
        Ok(())
    }

    // Task notes

    pub fn create_note(&self, task_id: EntityId, content: &str) -> StoreResult<TaskNote> {
        let note = self.tasks.create_note(task_id, content)?;
        self.announce(EntityKind::TaskNote, ChangeAction::Created, note.id, &note);
        Ok(note)
    }

    pub fn get_note(&self, id: EntityId) -> StoreResult<TaskNote> {
        self.tasks.get_note(id)
    }

    pub fn list_notes(&self, task_id: EntityId) -> StoreResult<Vec<TaskNote>> {
        self.tasks.list_notes(task_id)
    }

    pub fn update_note(&self, id: EntityId, content: &str) -> StoreResult<TaskNote> {
        let note = self.tasks.update_note(id, content)?;
        self.announce(EntityKind::TaskNote, ChangeAction::Updated, id, &note);
        Ok(note)
    }

    pub fn delete_note(&self, id: EntityId) -> StoreResult<()> {
        self.tasks.delete_note(id)?;
        self.announce_deleted(EntityKind::TaskNote, id);
        Ok(())
    }

    // Problems

    pub fn create_problem(&self, input: &NewProblem) -> StoreResult<Problem> {
        let problem = self.problems.create_problem(input)?;
        self.announce(EntityKind::Problem, ChangeAction::Created, problem.id, &problem);
        Ok(problem)
    }

    pub fn get_problem(&self, id: EntityId) -> StoreResult<Problem> {
        self.problems.get_problem(id)
    }

    pub fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<Vec<Problem>> {
        self.problems.list_problems(filter)
    }

    pub fn update_problem(&self, id: EntityId, patch: &ProblemPatch) -> StoreResult<Problem> {
        let problem = self.problems.update_problem(id, patch)?;
        self.announce(EntityKind::Problem, ChangeAction::Updated, id, &problem);
        Ok(problem)
    }

    pub fn delete_problem(&self, id: EntityId) -> StoreResult<()> {
        self.problems.delete_problem(id)?;
        self.announce_deleted(EntityKind::Problem, id);
        Ok(())
    }

    // Outcomes

    pub fn create_outcome(&self, input: &NewOutcome) -> StoreResult<Outcome> {
        let outcome = self.outcomes.create_outcome(input)?;
        self.announce(EntityKind::Outcome, ChangeAction::Created, outcome.id, &outcome);
        Ok(outcome)
    }

    pub fn get_outcome(&self, id: EntityId) -> StoreResult<Outcome> {
        self.outcomes.get_outcome(id)
    }

    pub fn list_outcomes(&self, filter: &OutcomeFilter) -> StoreResult<Vec<Outcome>> {
        self.outcomes.list_outcomes(filter)
    }

    pub fn update_outcome(&self, id: EntityId, patch: &OutcomePatch) -> StoreResult<Outcome> {
        let outcome = self.outcomes.update_outcome(id, patch)?;
        self.announce(EntityKind::Outcome, ChangeAction::Updated, id, &outcome);
        Ok(outcome)
    }

    pub fn delete_outcome(&self, id: EntityId) -> StoreResult<()> {
        self.outcomes.delete_outcome(id)?;
        self.announce_deleted(EntityKind::Outcome, id);
        Ok(())
    }

    // Goals

    pub fn create_goal(&self, input: &NewGoal) -> StoreResult<Goal> {
        let goal = self.goals.create_goal(input)?;
        self.announce(EntityKind::Goal, ChangeAction::Created, goal.id, &goal);
        Ok(goal)
    }

    pub fn get_goal(&self, id: EntityId) -> StoreResult<Goal> {
        self.goals.get_goal(id)
    }

    pub fn list_goals(&self, filter: &GoalFilter) -> StoreResult<Vec<Goal>> {
        self.goals.list_goals(filter)
    }

    pub fn update_goal(&self, id: EntityId, patch: &GoalPatch) -> StoreResult<Goal> {
        let goal = self.goals.update_goal(id, patch)?;
        self.announce(EntityKind::Goal, ChangeAction::Updated, id, &goal);
        Ok(goal)
    }

    pub fn delete_goal(&self, id: EntityId) -> StoreResult<()> {
        self.goals.delete_goal(id)?;
        self.announce_deleted(EntityKind::Goal, id);
        Ok(())
    }

    // Project links

    /// Links a goal or problem to an additional project.
    ///
    /// Re-linking an existing pair succeeds without publishing.
    pub fn link(
        &self,
        kind: LinkKind,
        child_id: EntityId,
        project_id: EntityId,
    ) -> StoreResult<()> {
        if self.links.link(kind, child_id, project_id)? {
            self.announce(
                kind.entity(),
                ChangeAction::Linked,
                child_id,
                &LinkPayload {
                    kind,
                    child_id,
                    project_id,
                },
            );
        }
        Ok(())
    }

    pub fn unlink(
        &self,
        kind: LinkKind,
        child_id: EntityId,
        project_id: EntityId,
    ) -> StoreResult<()> {
        self.links.unlink(kind, child_id, project_id)?;
        self.announce(
            kind.entity(),
            ChangeAction::Unlinked,
            child_id,
            &LinkPayload {
                kind,
                child_id,
                project_id,
            },
        );
        Ok(())
    }

    pub fn projects_for(
        &self,
        kind: LinkKind,
        child_id: EntityId,
    ) -> StoreResult<Vec<EntityId>> {
        self.links.projects_for(kind, child_id)
    }

    pub fn children_for(
        &self,
        project_id: EntityId,
        kind: LinkKind,
    ) -> StoreResult<Vec<EntityId>> {
        self.links.children_for(project_id, kind)
    }

    fn announce_deleted(&self, kind: EntityKind, id: EntityId) {
        self.announce(kind, ChangeAction::Deleted, id, &DeletedPayload { id });
    }

    fn announce<T: Serialize>(
        &self,
        kind: EntityKind,
        action: ChangeAction,
        id: EntityId,
        payload: &T,
    ) {
        let report = self.hub.publish(&change_event_type(kind, action), payload);
        info!(
            "event=entity_change module=service status=ok kind={} action={} id={} delivered={} dropped={}",
            kind, action, id, report.delivered, report.dropped
        );
    }
}
