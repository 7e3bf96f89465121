//! Goal repository contracts and SQLite implementation.
//!
//! Link handling is identical to problems; deleting a goal removes its
//! `goal_projects` rows.

use crate::model::enums::GoalType;
use crate::model::goal::{Goal, GoalFilter, GoalPatch, NewGoal};
use crate::model::{EntityId, EntityKind, LinkKind};
use crate::repo::error::StoreResult;
use crate::repo::integrity::{delete_linked_child, require_target, resolve_optional_links};
use crate::repo::sql::{
    ensure_schema_ready, load_by_id, now_epoch_ms, parse_literal, write_tx, ListQuery,
};
use log::info;
use rusqlite::{params, Connection, Row};

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    task_id,
    title,
    description,
    goal_type,
    assignee,
    created_at,
    updated_at
FROM goals";

pub trait GoalRepository {
    fn create_goal(&self, input: &NewGoal) -> StoreResult<Goal>;
    fn get_goal(&self, id: EntityId) -> StoreResult<Goal>;
    fn list_goals(&self, filter: &GoalFilter) -> StoreResult<Vec<Goal>>;
    fn update_goal(&self, id: EntityId, patch: &GoalPatch) -> StoreResult<Goal>;
    fn delete_goal(&self, id: EntityId) -> StoreResult<()>;
}

/// SQLite-backed goal repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, input: &NewGoal) -> StoreResult<Goal> {
        input.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let (project_id, task_id) =
                resolve_optional_links(conn, input.project_id, input.task_id)?;
            conn.execute(
                "INSERT INTO goals (
                    project_id,
                    task_id,
                    title,
                    description,
                    goal_type,
                    assignee,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
                params![
                    project_id,
                    task_id,
                    input.title.as_str(),
                    input.description.as_deref(),
                    input.goal_type.unwrap_or_default().as_str(),
                    input.assignee.as_deref(),
                    now,
                ],
            )?;
            load_goal(conn, conn.last_insert_rowid())
        })
    }

    fn get_goal(&self, id: EntityId) -> StoreResult<Goal> {
        load_goal(self.conn, id)
    }

    fn list_goals(&self, filter: &GoalFilter) -> StoreResult<Vec<Goal>> {
        let mut query = ListQuery::new(GOAL_SELECT_SQL);
        query
            .filter_eq("project_id", filter.project_id)
            .filter_eq("task_id", filter.task_id)
            .filter_eq("goal_type", filter.goal_type.map(|v| v.as_str().to_string()))
            .filter_eq("assignee", filter.assignee.clone());
        query.run(
            self.conn,
            "updated_at DESC, id DESC",
            filter.limit,
            filter.offset,
            parse_goal_row,
        )
    }

    fn update_goal(&self, id: EntityId, patch: &GoalPatch) -> StoreResult<Goal> {
        patch.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let current = load_goal(conn, id)?;
            let (project_id, task_id) = if patch.project_id.is_some() || patch.task_id.is_some() {
                resolve_optional_links(
                    conn,
                    patch.project_id.or(current.project_id),
                    patch.task_id.or(current.task_id),
                )?
            } else {
                (current.project_id, current.task_id)
            };

            conn.execute(
                "UPDATE goals
                 SET
                    project_id = ?2,
                    task_id = ?3,
                    title = ?4,
                    description = ?5,
                    goal_type = ?6,
                    assignee = ?7,
                    updated_at = MAX(?1, updated_at + 1)
                 WHERE id = ?8;",
                params![
                    now,
                    project_id,
                    task_id,
                    patch.title.as_deref().unwrap_or(&current.title),
                    patch
                        .description
                        .as_deref()
                        .or(current.description.as_deref()),
                    patch.goal_type.unwrap_or(current.goal_type).as_str(),
                    patch.assignee.as_deref().or(current.assignee.as_deref()),
                    id,
                ],
            )?;
            load_goal(conn, id)
        })
    }

    fn delete_goal(&self, id: EntityId) -> StoreResult<()> {
        let report = write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::Goal, id)?;
            delete_linked_child(conn, LinkKind::Goal, id)
        })?;

        info!(
            "event=entity_delete module=repo status=ok kind=goal id={} removed_link_rows={}",
            id, report.removed_link_rows
        );
        Ok(())
    }
}

fn load_goal(conn: &Connection, id: EntityId) -> StoreResult<Goal> {
    load_by_id(conn, GOAL_SELECT_SQL, EntityKind::Goal, id, parse_goal_row)
}

fn parse_goal_row(row: &Row<'_>) -> StoreResult<Goal> {
    Ok(Goal {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        goal_type: parse_literal::<GoalType>(row, "goal_type", "goals")?,
        assignee: row.get("assignee")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
