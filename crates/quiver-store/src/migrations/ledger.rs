//! The `database_migrations` ledger

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::migrations::ddl::table_exists;
use crate::migrations::environment::Environment;
use crate::migrations::migration::Migration;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

pub const LEDGER_TABLE: &str = "database_migrations";

pub const APPLIED_BY: &str = "migration_manager";

/// One ledger row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub version: String,
    pub name: String,
    pub checksum: String,
    pub applied_at: String,
    pub applied_by: String,
    pub environment: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl LedgerEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            name: row.get(2)?,
            checksum: row.get(3)?,
            applied_at: row.get(4)?,
            applied_by: row.get(5)?,
            environment: row.get(6)?,
            success: row.get(7)?,
            error_message: row.get(8)?,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "id, version, name, checksum, applied_at, applied_by, environment, success, error_message";

pub fn ensure_ledger(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS database_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            version TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            checksum TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            applied_by TEXT NOT NULL DEFAULT 'migration_manager',
            environment TEXT,
            success BOOLEAN NOT NULL DEFAULT 1,
            error_message TEXT,
            rollback_info TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn ledger_exists(conn: &Connection) -> Result<bool> {
    table_exists(conn, LEDGER_TABLE)
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Successful entries, oldest first
pub fn applied_entries(conn: &Connection) -> Result<Vec<LedgerEntry>> {
    if !ledger_exists(conn)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM database_migrations WHERE success = 1 ORDER BY applied_at, id",
            ENTRY_COLUMNS
        ))
        .map_err(from_rusqlite)?;
    let entries = stmt
        .query_map([], LedgerEntry::from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(entries)
}

/// Every entry recorded for a version
pub fn history(conn: &Connection, version: &str) -> Result<Vec<LedgerEntry>> {
    if !ledger_exists(conn)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM database_migrations WHERE version = ?1 ORDER BY applied_at, id",
            ENTRY_COLUMNS
        ))
        .map_err(from_rusqlite)?;
    let entries = stmt
        .query_map([version], LedgerEntry::from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(entries)
}

/// Record a successful application; runs inside the migration's transaction
pub fn record_success(conn: &Connection, migration: &dyn Migration, env: Environment) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO database_migrations
            (version, name, checksum, applied_at, applied_by, environment, success, error_message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, NULL)",
        params![
            migration.version(),
            migration.description(),
            migration.checksum(),
            now(),
            APPLIED_BY,
            env.as_str()
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Record a failed application after its transaction was rolled back
pub fn record_failure(
    conn: &Connection,
    migration: &dyn Migration,
    env: Environment,
    error: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO database_migrations
            (version, name, checksum, applied_at, applied_by, environment, success, error_message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            migration.version(),
            migration.description(),
            migration.checksum(),
            now(),
            APPLIED_BY,
            env.as_str(),
            error
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn remove(conn: &Connection, version: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM database_migrations WHERE version = ?1",
        [version],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}
