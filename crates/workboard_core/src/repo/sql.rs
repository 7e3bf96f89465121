//! Shared SQL plumbing for the entity repositories.

use crate::db::migrations::latest_version;
use crate::model::{EntityId, EntityKind};
use crate::repo::error::{StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Rejects connections that did not go through `open_db*`.
pub(crate) fn ensure_schema_ready(conn: &Connection) -> StoreResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Runs `op` inside an IMMEDIATE transaction so integrity checks and the
/// write commit together or not at all.
pub(crate) fn write_tx<T>(
    conn: &Connection,
    op: impl FnOnce(&Connection) -> StoreResult<T>,
) -> StoreResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Parses a persisted enumeration literal, surfacing drift as `InvalidData`.
pub(crate) fn parse_literal<T: FromStr>(
    row: &Row<'_>,
    column: &str,
    table: &str,
) -> StoreResult<T> {
    let text: String = row.get(column)?;
    text.parse::<T>().map_err(|_| {
        StoreError::InvalidData(format!("invalid value `{text}` in {table}.{column}"))
    })
}

/// Loads one row by primary key or fails with `NotFound`.
pub(crate) fn load_by_id<T>(
    conn: &Connection,
    select_sql: &str,
    kind: EntityKind,
    id: EntityId,
    parse: impl Fn(&Row<'_>) -> StoreResult<T>,
) -> StoreResult<T> {
    let mut stmt = conn.prepare(&format!("{select_sql} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse(row);
    }
    Err(StoreError::not_found(kind, id))
}

/// Incremental `SELECT ... WHERE` builder with positional binds.
pub(crate) struct ListQuery {
    sql: String,
    binds: Vec<Value>,
}

impl ListQuery {
    pub(crate) fn new(select_sql: &str) -> Self {
        Self {
            sql: format!("{select_sql} WHERE 1 = 1"),
            binds: Vec::new(),
        }
    }

    /// Adds `column = ?` when `value` is present.
    pub(crate) fn filter_eq<V: Into<Value>>(
        &mut self,
        column: &str,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.sql.push_str(&format!(" AND {column} = ?"));
            self.binds.push(value.into());
        }
        self
    }

    pub(crate) fn run<T>(
        mut self,
        conn: &Connection,
        order_by: &str,
        limit: Option<u32>,
        offset: u32,
        parse: impl Fn(&Row<'_>) -> StoreResult<T>,
    ) -> StoreResult<Vec<T>> {
        self.sql.push_str(&format!(" ORDER BY {order_by}"));
        if let Some(limit) = limit {
            self.sql.push_str(" LIMIT ?");
            self.binds.push(Value::Integer(i64::from(limit)));
            if offset > 0 {
                self.sql.push_str(" OFFSET ?");
                self.binds.push(Value::Integer(i64::from(offset)));
            }
        } else if offset > 0 {
            self.sql.push_str(" LIMIT -1 OFFSET ?");
            self.binds.push(Value::Integer(i64::from(offset)));
        }

        let mut stmt = conn.prepare(&self.sql)?;
        let mut rows = stmt.query(params_from_iter(self.binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse(row)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_schema_ready, now_epoch_ms};
    use crate::repo::error::StoreError;
    use rusqlite::Connection;

    #[test]
    fn raw_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = ensure_schema_ready(&conn).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_epoch_ms() > 0);
    }
}
