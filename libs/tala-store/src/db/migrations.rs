//! Schema lifecycle.
//!
//! The schema version lives in `PRAGMA user_version`. A new file reports 0
//! and gets the tables created; an older version is upgraded by dropping and
//! recreating every table. There is no data-preserving migration path.

use rusqlite::Connection;
use tracing::info;

use super::error::DbError;
use super::schema::{DROP_ALL, SCHEMA};

type Result<T> = std::result::Result<T, DbError>;

/// Read the recorded schema version (0 for a new database).
pub fn user_version(conn: &Connection) -> Result<i32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_user_version(conn: &Connection, version: i32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Create both tables if they do not exist yet.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Drop both tables and recreate them empty, then record `new_version`.
pub fn upgrade(conn: &Connection, old_version: i32, new_version: i32) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(DROP_ALL)?;
    initialize(&tx)?;
    set_user_version(&tx, new_version)?;
    tx.commit()?;
    info!(old_version, new_version, "Upgraded schema, all rows discarded");
    Ok(())
}

/// Bring the database to `target` on open.
pub fn run_migrations(conn: &Connection, target: i32) -> Result<()> {
    let current = user_version(conn)?;

    if current == 0 {
        initialize(conn)?;
        set_user_version(conn, target)?;
        info!(version = target, "Created schema");
    } else if current < target {
        upgrade(conn, current, target)?;
    } else if current > target {
        return Err(DbError::SchemaDowngrade {
            found: current,
            supported: target,
        });
    }

    Ok(())
}

/// Column names of `table` in declaration order. Empty if the table is missing.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(columns)
}
