//! Schema helpers for programmatic migrations
//!
//! All helpers run on the caller's connection or transaction and never
//! commit on their own.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::{Connection, OptionalExtension};

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(from_rusqlite)
}

/// Column names of `table` in declaration order
pub fn columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
        .map_err(from_rusqlite)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(names)
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    Ok(columns(conn, table)?.iter().any(|c| c == column))
}

/// Add a column unless it is already there
///
/// Returns `true` when the column was added. A "duplicate column name"
/// error from a concurrent writer counts as already present.
pub fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    declaration: &str,
) -> Result<bool> {
    if column_exists(conn, table, column)? {
        return Ok(false);
    }
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_ident(table),
        quote_ident(column),
        declaration
    );
    match conn.execute(&sql, []) {
        Ok(_) => {
            tracing::debug!(table, column, "column added");
            Ok(true)
        }
        Err(e) if e.to_string().contains("duplicate column name") => Ok(false),
        Err(e) => Err(from_rusqlite(e)),
    }
}

/// Rebuild `table` from `create_sql`, keeping the listed columns
///
/// `create_sql` must create a table named `<table>_new`; it is filled from
/// the old table, which is then dropped and replaced.
pub fn recreate_table(
    conn: &Connection,
    table: &str,
    create_sql: &str,
    keep_columns: &[&str],
) -> Result<()> {
    let new_table = format!("{}_new", table);
    let column_list = keep_columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    conn.execute_batch(create_sql).map_err(from_rusqlite)?;
    conn.execute(
        &format!(
            "INSERT INTO {} ({cols}) SELECT {cols} FROM {}",
            quote_ident(&new_table),
            quote_ident(table),
            cols = column_list
        ),
        [],
    )
    .map_err(from_rusqlite)?;
    conn.execute(&format!("DROP TABLE {}", quote_ident(table)), [])
        .map_err(from_rusqlite)?;
    conn.execute(
        &format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(&new_table),
            quote_ident(table)
        ),
        [],
    )
    .map_err(from_rusqlite)?;
    tracing::debug!(table, "table recreated");
    Ok(())
}

/// Drop a column if present
///
/// Uses `ALTER TABLE ... DROP COLUMN`, which refuses indexed, unique or key
/// columns; those need [`recreate_table`].
pub fn drop_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    if !column_exists(conn, table, column)? {
        return Ok(false);
    }
    conn.execute(
        &format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(column)
        ),
        [],
    )
    .map_err(from_rusqlite)?;
    Ok(true)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
