//! Project repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered `updated_at DESC, id DESC`.
//! - Deletes cascade through [`crate::repo::integrity`].

use crate::model::enums::ProjectStatus;
use crate::model::project::{NewProject, Project, ProjectFilter, ProjectPatch};
use crate::model::{EntityId, EntityKind};
use crate::repo::error::StoreResult;
use crate::repo::integrity::{delete_project_cascade, require_target};
use crate::repo::sql::{
    ensure_schema_ready, load_by_id, now_epoch_ms, parse_literal, write_tx, ListQuery,
};
use log::info;
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    status,
    external_link,
    created_at,
    updated_at
FROM projects";

pub trait ProjectRepository {
    fn create_project(&self, input: &NewProject) -> StoreResult<Project>;
    fn get_project(&self, id: EntityId) -> StoreResult<Project>;
    fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>>;
    fn update_project(&self, id: EntityId, patch: &ProjectPatch) -> StoreResult<Project>;
    fn delete_project(&self, id: EntityId) -> StoreResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, input: &NewProject) -> StoreResult<Project> {
        input.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            conn.execute(
                "INSERT INTO projects (
                    name,
                    description,
                    status,
                    external_link,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
                params![
                    input.name.as_str(),
                    input.description.as_deref(),
                    input.status.unwrap_or_default().as_str(),
                    input.external_link.as_deref(),
                    now,
                ],
            )?;
            load_project(conn, conn.last_insert_rowid())
        })
    }

    fn get_project(&self, id: EntityId) -> StoreResult<Project> {
        load_project(self.conn, id)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        let mut query = ListQuery::new(PROJECT_SELECT_SQL);
        query.filter_eq("status", filter.status.map(|s| s.as_str().to_string()));
        query.run(
            self.conn,
            "updated_at DESC, id DESC",
            filter.limit,
            filter.offset,
            parse_project_row,
        )
    }

    fn update_project(&self, id: EntityId, patch: &ProjectPatch) -> StoreResult<Project> {
        patch.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let current = load_project(conn, id)?;
            conn.execute(
                "UPDATE projects
                 SET
                    name = ?2,
                    description = ?3,
                    status = ?4,
                    external_link = ?5,
                    updated_at = MAX(?1, updated_at + 1)
                 WHERE id = ?6;",
                params![
                    now,
                    patch.name.as_deref().unwrap_or(&current.name),
                    patch
                        .description
                        .as_deref()
                        .or(current.description.as_deref()),
                    patch.status.unwrap_or(current.status).as_str(),
                    patch
                        .external_link
                        .as_deref()
                        .or(current.external_link.as_deref()),
                    id,
                ],
            )?;
            load_project(conn, id)
        })
    }

    fn delete_project(&self, id: EntityId) -> StoreResult<()> {
        let now = now_epoch_ms();
        let report = write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::Project, id)?;
            delete_project_cascade(conn, id, now)
        })?;

        info!(
            "event=entity_delete module=repo status=ok kind=project id={} cascaded_tasks={} cascaded_outcomes={} cleared_links={} removed_link_rows={}",
            id,
            report.deleted_tasks,
            report.deleted_outcomes,
            report.cleared_project_links + report.cleared_task_links,
            report.removed_link_rows
        );
        Ok(())
    }
}

fn load_project(conn: &Connection, id: EntityId) -> StoreResult<Project> {
    load_by_id(conn, PROJECT_SELECT_SQL, EntityKind::Project, id, parse_project_row)
}

fn parse_project_row(row: &Row<'_>) -> StoreResult<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_literal::<ProjectStatus>(row, "status", "projects")?,
        external_link: row.get("external_link")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
