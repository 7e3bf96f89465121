//! Referential integrity engine.
//!
//! # Responsibility
//! - Check parent existence and task/project agreement before writes.
//! - Apply delete policies so callers never manage deletion order.
//!
//! # Invariants
//! - Every function here runs on a connection that is already inside the
//!   caller's write transaction; none of them opens its own.
//! - Deleting a project removes its tasks and outcomes (and everything those
//!   own), clears primary project links on problems/goals and removes every
//!   junction row naming it.
//! - Deleting a task removes its notes and clears task links on
//!   problems/goals/outcomes; their project links are untouched.
//! - Rows whose links are cleared get `updated_at` advanced.

use crate::model::validation::ValidationError;
use crate::model::{EntityId, EntityKind, LinkKind};
use crate::repo::error::{StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

const LINKED_CHILD_KINDS: [LinkKind; 2] = [LinkKind::Goal, LinkKind::Problem];
const TASK_LINKED_TABLES: [&str; 3] = ["problems", "goals", "outcomes"];
const PROJECT_LINKED_TABLES: [&str; 2] = ["problems", "goals"];

/// Row counts touched by one cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CascadeReport {
    pub deleted_tasks: usize,
    pub deleted_notes: usize,
    pub deleted_outcomes: usize,
    pub cleared_project_links: usize,
    pub cleared_task_links: usize,
    pub removed_link_rows: usize,
}

impl CascadeReport {
    fn absorb(&mut self, other: CascadeReport) {
        self.deleted_tasks += other.deleted_tasks;
        self.deleted_notes += other.deleted_notes;
        self.deleted_outcomes += other.deleted_outcomes;
        self.cleared_project_links += other.cleared_project_links;
        self.cleared_task_links += other.cleared_task_links;
        self.removed_link_rows += other.removed_link_rows;
    }
}

pub(crate) fn row_exists(conn: &Connection, kind: EntityKind, id: EntityId) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);", kind.table()),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `NotFound` when the operation target is missing.
pub(crate) fn require_target(conn: &Connection, kind: EntityKind, id: EntityId) -> StoreResult<()> {
    if row_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(StoreError::not_found(kind, id))
    }
}

/// Fails with `Reference` when a foreign key names a missing row.
pub(crate) fn require_reference(
    conn: &Connection,
    kind: EntityKind,
    id: EntityId,
) -> StoreResult<()> {
    if row_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(StoreError::reference(kind, id))
    }
}

/// Returns the owning project of a task referenced by another row.
pub(crate) fn referenced_task_project(
    conn: &Connection,
    task_id: EntityId,
) -> StoreResult<EntityId> {
    conn.query_row(
        "SELECT project_id FROM tasks WHERE id = ?1;",
        [task_id],
        |row| row.get::<_, EntityId>(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::reference(EntityKind::Task, task_id))
}

/// Resolves an optional project/task pair for problems and goals.
///
/// Returns the effective `(project_id, task_id)`: a lone task reference
/// inherits the task's project.
pub(crate) fn resolve_optional_links(
    conn: &Connection,
    project_id: Option<EntityId>,
    task_id: Option<EntityId>,
) -> StoreResult<(Option<EntityId>, Option<EntityId>)> {
    if let Some(project_id) = project_id {
        require_reference(conn, EntityKind::Project, project_id)?;
    }

    let Some(task_id) = task_id else {
        return Ok((project_id, None));
    };

    let task_project_id = referenced_task_project(conn, task_id)?;
    match project_id {
        None => Ok((Some(task_project_id), Some(task_id))),
        Some(project_id) if project_id == task_project_id => Ok((Some(project_id), Some(task_id))),
        Some(project_id) => Err(ValidationError::ProjectTaskMismatch {
            task_id,
            task_project_id,
            project_id,
        }
        .into()),
    }
}

/// Checks that `task_id` exists and is owned by `project_id`.
pub(crate) fn require_task_in_project(
    conn: &Connection,
    task_id: EntityId,
    project_id: EntityId,
) -> StoreResult<()> {
    let task_project_id = referenced_task_project(conn, task_id)?;
    if task_project_id != project_id {
        return Err(ValidationError::ProjectTaskMismatch {
            task_id,
            task_project_id,
            project_id,
        }
        .into());
    }
    Ok(())
}

/// Deletes one task and applies its child policies.
pub(crate) fn delete_task_cascade(
    conn: &Connection,
    task_id: EntityId,
    now: i64,
) -> StoreResult<CascadeReport> {
    let mut report = CascadeReport {
        deleted_notes: conn.execute("DELETE FROM task_notes WHERE task_id = ?1;", [task_id])?,
        ..CascadeReport::default()
    };

    for table in TASK_LINKED_TABLES {
        report.cleared_task_links += conn.execute(
            &format!(
                "UPDATE {table}
                 SET task_id = NULL,
                     updated_at = MAX(?1, updated_at + 1)
                 WHERE task_id = ?2;"
            ),
            params![now, task_id],
        )?;
    }

    report.deleted_tasks = conn.execute("DELETE FROM tasks WHERE id = ?1;", [task_id])?;
    debug!(
        "event=cascade module=integrity kind=task id={} deleted_notes={} cleared_task_links={}",
        task_id, report.deleted_notes, report.cleared_task_links
    );
    Ok(report)
}

/// Deletes one project and everything it owns.
pub(crate) fn delete_project_cascade(
    conn: &Connection,
    project_id: EntityId,
    now: i64,
) -> StoreResult<CascadeReport> {
    let task_ids = {
        let mut stmt = conn.prepare("SELECT id FROM tasks WHERE project_id = ?1 ORDER BY id;")?;
        let ids = stmt
            .query_map([project_id], |row| row.get::<_, EntityId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids
    };

    let mut report = CascadeReport::default();
    for task_id in task_ids {
        report.absorb(delete_task_cascade(conn, task_id, now)?);
    }

    report.deleted_outcomes +=
        conn.execute("DELETE FROM outcomes WHERE project_id = ?1;", [project_id])?;

    for table in PROJECT_LINKED_TABLES {
        report.cleared_project_links += conn.execute(
            &format!(
                "UPDATE {table}
                 SET project_id = NULL,
                     updated_at = MAX(?1, updated_at + 1)
                 WHERE project_id = ?2;"
            ),
            params![now, project_id],
        )?;
    }

    for kind in LINKED_CHILD_KINDS {
        report.removed_link_rows += conn.execute(
            &format!("DELETE FROM {} WHERE project_id = ?1;", kind.junction_table()),
            [project_id],
        )?;
    }

    conn.execute("DELETE FROM projects WHERE id = ?1;", [project_id])?;
    debug!(
        "event=cascade module=integrity kind=project id={} deleted_tasks={} deleted_outcomes={} cleared_project_links={} removed_link_rows={}",
        project_id,
        report.deleted_tasks,
        report.deleted_outcomes,
        report.cleared_project_links,
        report.removed_link_rows
    );
    Ok(report)
}

/// Deletes a goal or problem together with all of its junction rows.
pub(crate) fn delete_linked_child(
    conn: &Connection,
    kind: LinkKind,
    child_id: EntityId,
) -> StoreResult<CascadeReport> {
    let removed_link_rows = conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1;",
            kind.junction_table(),
            kind.child_column()
        ),
        [child_id],
    )?;
    conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1;", kind.entity().table()),
        [child_id],
    )?;
    Ok(CascadeReport {
        removed_link_rows,
        ..CascadeReport::default()
    })
}

#[cfg(test)]
mod tests {
    use super::{delete_project_cascade, resolve_optional_links, CascadeReport};
    use crate::db::open_db_in_memory;
    use crate::model::validation::ValidationError;
    use crate::model::EntityKind;
    use crate::repo::error::StoreError;
    use rusqlite::{params, Connection};

    fn seed(conn: &Connection) -> (i64, i64, i64) {
        conn.execute_batch(
            "INSERT INTO projects (name, created_at, updated_at) VALUES ('a', 1, 1);
             INSERT INTO projects (name, created_at, updated_at) VALUES ('b', 1, 1);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (project_id, title, created_at, updated_at) VALUES (?1, 't', 1, 1);",
            params![1],
        )
        .unwrap();
        (1, 2, conn.last_insert_rowid())
    }

    #[test]
    fn lone_task_reference_inherits_project() {
        let conn = open_db_in_memory().unwrap();
        let (project_a, _, task) = seed(&conn);
        let resolved = resolve_optional_links(&conn, None, Some(task)).unwrap();
        assert_eq!(resolved, (Some(project_a), Some(task)));
    }

    #[test]
    fn mismatched_pair_is_validation_not_reference() {
        let conn = open_db_in_memory().unwrap();
        let (_, project_b, task) = seed(&conn);
        let err = resolve_optional_links(&conn, Some(project_b), Some(task)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::ProjectTaskMismatch { .. })
        ));
    }

    #[test]
    fn missing_task_is_reference_error() {
        let conn = open_db_in_memory().unwrap();
        seed(&conn);
        let err = resolve_optional_links(&conn, None, Some(404)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Reference {
                kind: EntityKind::Task,
                id: 404
            }
        ));
    }

    #[test]
    fn project_cascade_reports_every_touched_row() {
        let conn = open_db_in_memory().unwrap();
        let (project_a, _, task) = seed(&conn);
        conn.execute_batch(
            "INSERT INTO task_notes (task_id, content, created_at, updated_at) VALUES (1, 'n', 1, 1);
             INSERT INTO outcomes (project_id, title, created_at, updated_at) VALUES (1, 'o', 1, 1);
             INSERT INTO goals (project_id, task_id, title, created_at, updated_at) VALUES (1, 1, 'g', 1, 1);
             INSERT INTO problems (title, created_at, updated_at) VALUES ('p', 1, 1);
             INSERT INTO problem_projects (problem_id, project_id, created_at) VALUES (1, 1, 1);",
        )
        .unwrap();
        assert_eq!(task, 1);

        let report = delete_project_cascade(&conn, project_a, 10).unwrap();
        assert_eq!(
            report,
            CascadeReport {
                deleted_tasks: 1,
                deleted_notes: 1,
                deleted_outcomes: 1,
                cleared_project_links: 1,
                cleared_task_links: 1,
                removed_link_rows: 1,
            }
        );

        let (goal_project, goal_task, goal_updated): (Option<i64>, Option<i64>, i64) = conn
            .query_row(
                "SELECT project_id, task_id, updated_at FROM goals WHERE id = 1;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((goal_project, goal_task), (None, None));
        assert!(goal_updated >= 10);
    }

    #[test]
    fn reports_accumulate() {
        let mut total = CascadeReport {
            deleted_tasks: 1,
            ..CascadeReport::default()
        };
        total.absorb(CascadeReport {
            deleted_tasks: 2,
            deleted_notes: 3,
            ..CascadeReport::default()
        });
        assert_eq!(total.deleted_tasks, 3);
        assert_eq!(total.deleted_notes, 3);
    }
}
