//! Task and task-note repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A task's project must exist at creation; it never changes afterwards.
//! - Tasks list `updated_at DESC, id DESC`; notes list `created_at ASC, id ASC`.

use crate::model::enums::{TaskPriority, TaskStatus, TaskType};
use crate::model::task::{NewTask, Task, TaskFilter, TaskNote, TaskPatch};
use crate::model::validation::require_text;
use crate::model::{EntityId, EntityKind};
use crate::repo::error::StoreResult;
use crate::repo::integrity::{delete_task_cascade, require_reference, require_target};
use crate::repo::sql::{
    ensure_schema_ready, load_by_id, now_epoch_ms, parse_literal, write_tx, ListQuery,
};
use log::info;
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    description,
    task_type,
    status,
    priority,
    external_link,
    created_at,
    updated_at
FROM tasks";

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    content,
    created_at,
    updated_at
FROM task_notes";

pub trait TaskRepository {
    fn create_task(&self, input: &NewTask) -> StoreResult<Task>;
    fn get_task(&self, id: EntityId) -> StoreResult<Task>;
    fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;
    fn update_task(&self, id: EntityId, patch: &TaskPatch) -> StoreResult<Task>;
    fn delete_task(&self, id: EntityId) -> StoreResult<()>;

    fn create_note(&self, task_id: EntityId, content: &str) -> StoreResult<TaskNote>;
    fn get_note(&self, id: EntityId) -> StoreResult<TaskNote>;
    /// Notes of one task, oldest first. Fails with `NotFound` for a missing task.
    fn list_notes(&self, task_id: EntityId) -> StoreResult<Vec<TaskNote>>;
    fn update_note(&self, id: EntityId, content: &str) -> StoreResult<TaskNote>;
    fn delete_note(&self, id: EntityId) -> StoreResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, input: &NewTask) -> StoreResult<Task> {
        input.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            require_reference(conn, EntityKind::Project, input.project_id)?;
            conn.execute(
                "INSERT INTO tasks (
                    project_id,
                    title,
                    description,
                    task_type,
                    status,
                    priority,
                    external_link,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8);",
                params![
                    input.project_id,
                    input.title.as_str(),
                    input.description.as_deref(),
                    input.task_type.unwrap_or_default().as_str(),
                    input.status.unwrap_or_default().as_str(),
                    input.priority.unwrap_or_default().as_str(),
                    input.external_link.as_deref(),
                    now,
                ],
            )?;
            load_task(conn, conn.last_insert_rowid())
        })
    }

    fn get_task(&self, id: EntityId) -> StoreResult<Task> {
        load_task(self.conn, id)
    }

    fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let mut query = ListQuery::new(TASK_SELECT_SQL);
        query
            .filter_eq("project_id", filter.project_id)
            .filter_eq("status", filter.status.map(|v| v.as_str().to_string()))
            .filter_eq("task_type", filter.task_type.map(|v| v.as_str().to_string()))
            .filter_eq("priority", filter.priority.map(|v| v.as_str().to_string()));
        query.run(
            self.conn,
            "updated_at DESC, id DESC",
            filter.limit,
            filter.offset,
            parse_task_row,
        )
    }

    fn update_task(&self, id: EntityId, patch: &TaskPatch) -> StoreResult<Task> {
        patch.validate()?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            let current = load_task(conn, id)?;
            conn.execute(
                "UPDATE tasks
                 SET
                    title = ?2,
                    description = ?3,
                    task_type = ?4,
                    status = ?5,
                    priority = ?6,
                    external_link = ?7,
                    updated_at = MAX(?1, updated_at + 1)
                 WHERE id = ?8;",
                params![
                    now,
                    patch.title.as_deref().unwrap_or(&current.title),
                    patch
                        .description
                        .as_deref()
                        .or(current.description.as_deref()),
                    patch.task_type.unwrap_or(current.task_type).as_str(),
                    patch.status.unwrap_or(current.status).as_str(),
                    patch.priority.unwrap_or(current.priority).as_str(),
                    patch
                        .external_link
                        .as_deref()
                        .or(current.external_link.as_deref()),
                    id,
                ],
            )?;
            load_task(conn, id)
        })
    }

    fn delete_task(&self, id: EntityId) -> StoreResult<()> {
        let now = now_epoch_ms();
        let report = write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::Task, id)?;
            delete_task_cascade(conn, id, now)
        })?;

        info!(
            "event=entity_delete module=repo status=ok kind=task id={} cascaded_notes={} cleared_links={}",
            id, report.deleted_notes, report.cleared_task_links
        );
        Ok(())
    }

    fn create_note(&self, task_id: EntityId, content: &str) -> StoreResult<TaskNote> {
        require_text("content", content)?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            require_reference(conn, EntityKind::Task, task_id)?;
            conn.execute(
                "INSERT INTO task_notes (task_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3);",
                params![task_id, content, now],
            )?;
            load_note(conn, conn.last_insert_rowid())
        })
    }

    fn get_note(&self, id: EntityId) -> StoreResult<TaskNote> {
        load_note(self.conn, id)
    }

    fn list_notes(&self, task_id: EntityId) -> StoreResult<Vec<TaskNote>> {
        require_target(self.conn, EntityKind::Task, task_id)?;
        let mut query = ListQuery::new(NOTE_SELECT_SQL);
        query.filter_eq("task_id", Some(task_id));
        query.run(self.conn, "created_at ASC, id ASC", None, 0, parse_note_row)
    }

    fn update_note(&self, id: EntityId, content: &str) -> StoreResult<TaskNote> {
        require_text("content", content)?;
        let now = now_epoch_ms();

        write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::TaskNote, id)?;
            conn.execute(
                "UPDATE task_notes
                 SET
                    content = ?2,
                    updated_at = MAX(?1, updated_at + 1)
                 WHERE id = ?3;",
                params![now, content, id],
            )?;
            load_note(conn, id)
        })
    }

    fn delete_note(&self, id: EntityId) -> StoreResult<()> {
        write_tx(self.conn, |conn| {
            require_target(conn, EntityKind::TaskNote, id)?;
            conn.execute("DELETE FROM task_notes WHERE id = ?1;", [id])?;
            Ok(())
        })
    }
}

fn load_task(conn: &Connection, id: EntityId) -> StoreResult<Task> {
    load_by_id(conn, TASK_SELECT_SQL, EntityKind::Task, id, parse_task_row)
}

fn load_note(conn: &Connection, id: EntityId) -> StoreResult<TaskNote> {
    load_by_id(conn, NOTE_SELECT_SQL, EntityKind::TaskNote, id, parse_note_row)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        task_type: parse_literal::<TaskType>(row, "task_type", "tasks")?,
        status: parse_literal::<TaskStatus>(row, "status", "tasks")?,
        priority: parse_literal::<TaskPriority>(row, "priority", "tasks")?,
        external_link: row.get("external_link")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<TaskNote> {
    Ok(TaskNote {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
