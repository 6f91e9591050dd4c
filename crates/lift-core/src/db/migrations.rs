//! Database migrations

use crate::error::Result;
use crate::models::Table;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Document-style table shared by every syncable entity.
///
/// `uuid`, `updated_at` and `deleted_at` are copied out of `data` so merge
/// lookups and the tombstone reaper can use indexes.
fn record_table_statements(table: Table) -> Vec<String> {
    let name = table.sql_name();
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                updated_at INTEGER NOT NULL,
                deleted_at INTEGER,
                data TEXT NOT NULL
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{name}_updated ON {name}(updated_at)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{name}_deleted ON {name}(deleted_at)"),
    ]
}

/// Migration to version 1: record tables and local metadata
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    for table in Table::ALL {
        for stmt in record_table_statements(table) {
            tx.execute(&stmt, [])?;
        }
    }

    // Device-local key/value state, never synced
    tx.execute(
        "CREATE TABLE IF NOT EXISTS local_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    tx.commit()?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
