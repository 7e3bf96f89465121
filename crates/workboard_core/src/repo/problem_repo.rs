//! Problem repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `project_id`/`task_id` pairs are resolved by
//!   [`crate::repo::integrity::resolve_optional_links`] on every write that
//!   touches them.
//! - Deleting a problem removes its `problem_projects` rows.

use crate::model::enums::ProblemStatus;
use crate::model::problem::{NewProblem, Problem, ProblemFilter, ProblemPatch};
use crate::model::{EntityId, EntityKind, LinkKind};
use crate::repo::error::StoreResult;
use crate::repo::integrity::{delete_linked_child, require_target, resolve_optional_links};
use crate::repo::sql::{
    ensure_schema_ready, load_by_id, now_epoch_ms, parse_literal, write_tx, ListQuery,
};
use log::info;
use rusqlite::{params, Connection, Row};

const PROBLEM_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    task_id,
    title,
    description,
    status,
    assignee,
    created_at,
    updated_at
FROM problems";

pub trait ProblemRepository {
    fn create_problem(&self, input: &NewProblem) -> StoreResult<Problem>;
    fn get_problem(&self, id: EntityId) -> StoreResult<Problem>;
    fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<Vec<Problem>>;
    fn update_problem(&self, id: EntityId, patch: &ProblemPatch) -> StoreResult<Problem>;
    fn delete_problem(&self, id: EntityId) -> StoreResult<()>;
}

/// SQLite-backed problem repository.
pub struct SqliteProblemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProblemRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProblemRepository for SqliteProblemRepository<'_> {
    fn create_problem(&self, input: &NewProblem) -> StoreResult<Problem> {
        input.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let (project_id, task_id) =
                resolve_optional_links(conn, input.project_id, input.task_id)?;
            conn.execute(
                "INSERT INTO problems (
                    project_id,
                    task_id,
                    title,
                    description,
                    status,
                    assignee,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
                params![
                    project_id,
                    task_id,
                    input.title.as_str(),
                    input.description.as_deref(),
                    input.status.unwrap_or_default().as_str(),
                    input.assignee.as_deref(),
                    now,
                ],
            )?;
            load_problem(conn, conn.last_insert_rowid())
        })
    }

    fn get_problem(&self, id: EntityId) -> StoreResult<Problem> {
        load_problem(self.conn, id)
    }

    fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<Vec<Problem>> {
        let mut query = ListQuery::new(PROBLEM_SELECT_SQL);
        query
            .filter_eq("project_id", filter.project_id)
            .filter_eq("task_id", filter.task_id)
            .filter_eq("status", filter.status.map(|v| v.as_str().to_string()))
            .filter_eq("assignee", filter.assignee.clone());
        query.run(
            self.conn,
            "updated_at DESC, id DESC",
            filter.limit,
            filter.offset,
            parse_problem_row,
        )
    }

    fn update_problem(&self, id: EntityId, patch: &ProblemPatch) -> StoreResult<Problem> {
        patch.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let current = load_problem(conn, id)?;
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
                "UPDATE problems
                 SET
                    project_id = ?2,
                    task_id = ?3,
                    title = ?4,
                    description = ?5,
                    status = ?6,
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
                    patch.status.unwrap_or(current.status).as_str(),
                    patch.assignee.as_deref().or(current.assignee.as_deref()),
                    id,
                ],
            )?;
            load_problem(conn, id)
        })
    }

    fn delete_problem(&self, id: EntityId) -> StoreResult<()> {
        let report = write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::Problem, id)?;
            delete_linked_child(conn, LinkKind::Problem, id)
        })?;

        info!(
            "event=entity_delete module=repo status=ok kind=problem id={} removed_link_rows={}",
            id, report.removed_link_rows
        );
        Ok(())
    }
}

fn load_problem(conn: &Connection, id: EntityId) -> StoreResult<Problem> {
    load_by_id(conn, PROBLEM_SELECT_SQL, EntityKind::Problem, id, parse_problem_row)
}

fn parse_problem_row(row: &Row<'_>) -> StoreResult<Problem> {
    Ok(Problem {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_literal::<ProblemStatus>(row, "status", "problems")?,
        assignee: row.get("assignee")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
