//! Outcome repository contracts and SQLite implementation.
//!
//! # Invariants
//! - The owning project must exist at creation and never changes.
//! - A task link, when present, names a task of the owning project.

use crate::model::enums::OutcomeStatus;
use crate::model::outcome::{NewOutcome, Outcome, OutcomeFilter, OutcomePatch};
use crate::model::{EntityId, EntityKind};
use crate::repo::error::StoreResult;
use crate::repo::integrity::{require_reference, require_target, require_task_in_project};
use crate::repo::sql::{
    ensure_schema_ready, load_by_id, now_epoch_ms, parse_literal, write_tx, ListQuery,
};
use log::info;
use rusqlite::{params, Connection, Row};

const OUTCOME_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    task_id,
    title,
    description,
    status,
    created_at,
    updated_at
FROM outcomes";

pub trait OutcomeRepository {
    fn create_outcome(&self, input: &NewOutcome) -> StoreResult<Outcome>;
    fn get_outcome(&self, id: EntityId) -> StoreResult<Outcome>;
    fn list_outcomes(&self, filter: &OutcomeFilter) -> StoreResult<Vec<Outcome>>;
    fn update_outcome(&self, id: EntityId, patch: &OutcomePatch) -> StoreResult<Outcome>;
    fn delete_outcome(&self, id: EntityId) -> StoreResult<()>;
}

/// SQLite-backed outcome repository.
pub struct SqliteOutcomeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutcomeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl OutcomeRepository for SqliteOutcomeRepository<'_> {
    fn create_outcome(&self, input: &NewOutcome) -> StoreResult<Outcome> {
        input.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            require_reference(conn, EntityKind::Project, input.project_id)?;
            if let Some(task_id) = input.task_id {
                require_task_in_project(conn, task_id, input.project_id)?;
            }
            conn.execute(
                "INSERT INTO outcomes (
                    project_id,
                    task_id,
                    title,
                    description,
                    status,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
                params![
                    input.project_id,
                    input.task_id,
                    input.title.as_str(),
                    input.description.as_deref(),
                    input.status.unwrap_or_default().as_str(),
                    now,
                ],
            )?;
            load_outcome(conn, conn.last_insert_rowid())
        })
    }

    fn get_outcome(&self, id: EntityId) -> StoreResult<Outcome> {
        load_outcome(self.conn, id)
    }

    fn list_outcomes(&self, filter: &OutcomeFilter) -> StoreResult<Vec<Outcome>> {
        let mut query = ListQuery::new(OUTCOME_SELECT_SQL);
        query
            .filter_eq("project_id", filter.project_id)
            .filter_eq("task_id", filter.task_id)
            .filter_eq("status", filter.status.map(|v| v.as_str().to_string()));
        query.run(
            self.conn,
            "updated_at DESC, id DESC",
            filter.limit,
            filter.offset,
            parse_outcome_row,
        )
    }

    fn update_outcome(&self, id: EntityId, patch: &OutcomePatch) -> StoreResult<Outcome> {
        patch.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let current = load_outcome(conn, id)?;
            if let Some(task_id) = patch.task_id {
                require_task_in_project(conn, task_id, current.project_id)?;
            }

            conn.execute(
                "UPDATE outcomes
                 SET
                    task_id = ?2,
                    title = ?3,
                    description = ?4,
                    status = ?5,
                    updated_at = MAX(?1, updated_at + 1)
                 WHERE id = ?6;",
                params![
                    now,
                    patch.task_id.or(current.task_id),
                    patch.title.as_deref().unwrap_or(&current.title),
                    patch
                        .description
                        .as_deref()
                        .or(current.description.as_deref()),
                    patch.status.unwrap_or(current.status).as_str(),
                    id,
                ],
            )?;
            load_outcome(conn, id)
        })
    }

    fn delete_outcome(&self, id: EntityId) -> StoreResult<()> {
        write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::Outcome, id)?;
            conn.execute("DELETE FROM outcomes WHERE id = ?1;", [id])?;
            Ok(())
        })?;

        info!("event=entity_delete module=repo status=ok kind=outcome id={id}");
        Ok(())
    }
}

fn load_outcome(conn: &Connection, id: EntityId) -> StoreResult<Outcome> {
    load_by_id(conn, OUTCOME_SELECT_SQL, EntityKind::Outcome, id, parse_outcome_row)
}

fn parse_outcome_row(row: &Row<'_>) -> StoreResult<Outcome> {
    Ok(Outcome {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_literal::<OutcomeStatus>(row, "status", "outcomes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
