//! Junction-row repository for additional goal/problem ↔ project links.
//!
//! # Invariants
//! - A junction row is only written when both ends exist.
//! - Linking an already linked pair is a successful no-op.
//! - Unlinking a pair that was never linked is `LinkNotFound`.
//! - Junction rows never touch the child's primary `project_id`.

use crate::model::{EntityId, EntityKind, LinkKind};
use crate::repo::error::{StoreError, StoreResult};
use crate::repo::integrity::{require_reference, require_target};
use crate::repo::sql::{ensure_schema_ready, now_epoch_ms, write_tx};
use rusqlite::{params, Connection};

pub trait LinkRepository {
    /// Adds a junction row. Returns `true` when a new row was written.
    fn link(&self, kind: LinkKind, child_id: EntityId, project_id: EntityId) -> StoreResult<bool>;
    fn unlink(&self, kind: LinkKind, child_id: EntityId, project_id: EntityId) -> StoreResult<()>;
    /// Projects linked to one child, ascending by id.
    fn projects_for(&self, kind: LinkKind, child_id: EntityId) -> StoreResult<Vec<EntityId>>;
    /// Children of `kind` linked to one project, ascending by id.
    fn children_for(&self, project_id: EntityId, kind: LinkKind) -> StoreResult<Vec<EntityId>>;
}

/// SQLite-backed junction repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn link(&self, kind: LinkKind, child_id: EntityId, project_id: EntityId) -> StoreResult<bool> {
        let now = now_epoch_ms();
        write_tx(self.conn, |conn| {
            require_target(conn, kind.entity(), child_id)?;
            require_reference(conn, EntityKind::Project, project_id)?;
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}, project_id, created_at) VALUES (?1, ?2, ?3);",
                    kind.junction_table(),
                    kind.child_column()
                ),
                params![child_id, project_id, now],
            )?;
            if inserted > 0 {
                touch(conn, kind, child_id, now)?;
            }
            Ok(inserted > 0)
        })
    }

    fn unlink(&self, kind: LinkKind, child_id: EntityId, project_id: EntityId) -> StoreResult<()> {
        let now = now_epoch_ms();
        write_tx(self.conn, |conn| {
            require_target(conn, kind.entity(), child_id)?;
            let removed = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1 AND project_id = ?2;",
                    kind.junction_table(),
                    kind.child_column()
                ),
                params![child_id, project_id],
            )?;
            if removed == 0 {
                return Err(StoreError::LinkNotFound {
                    kind,
                    child_id,
                    project_id,
                });
            }
            touch(conn, kind, child_id, now)
        })
    }

    fn projects_for(&self, kind: LinkKind, child_id: EntityId) -> StoreResult<Vec<EntityId>> {
        require_target(self.conn, kind.entity(), child_id)?;
        collect_ids(
            self.conn,
            &format!(
                "SELECT project_id FROM {} WHERE {} = ?1 ORDER BY project_id ASC;",
                kind.junction_table(),
                kind.child_column()
            ),
            child_id,
        )
    }

    fn children_for(&self, project_id: EntityId, kind: LinkKind) -> StoreResult<Vec<EntityId>> {
        require_target(self.conn, EntityKind::Project, project_id)?;
        let column = kind.child_column();
        collect_ids(
            self.conn,
            &format!(
                "SELECT {column} FROM {} WHERE project_id = ?1 ORDER BY {column} ASC;",
                kind.junction_table()
            ),
            project_id,
        )
    }
}

fn touch(conn: &Connection, kind: LinkKind, child_id: EntityId, now: i64) -> StoreResult<()> {
    conn.execute(
        &format!(
            "UPDATE {} SET updated_at = MAX(?1, updated_at + 1) WHERE id = ?2;",
            kind.entity().table()
        ),
        params![now, child_id],
    )?;
    Ok(())
}

fn collect_ids(conn: &Connection, sql: &str, key: EntityId) -> StoreResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([key], |row| row.get::<_, EntityId>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
