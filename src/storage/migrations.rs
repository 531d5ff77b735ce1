//! Database migrations for wellkeep.
//!
//! Each migration upgrades the schema by one version and runs automatically
//! when the database is opened.

use rusqlite::Connection;

use crate::error::WellkeepError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, WellkeepError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| WellkeepError::Database(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), WellkeepError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| WellkeepError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), WellkeepError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), WellkeepError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(WellkeepError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: keyed slot table.
///
/// One row per slot key; values are JSON text, overwritten in place.
fn migrate_v1(conn: &Connection) -> Result<(), WellkeepError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS local_slots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| WellkeepError::Database(format!("Migration v1 failed: {e}")))
}
