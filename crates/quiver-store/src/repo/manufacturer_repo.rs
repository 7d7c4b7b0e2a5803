//! Manufacturer registry

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub website_url: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
}

pub struct ManufacturerRepo;

impl ManufacturerRepo {
    /// Id of the named manufacturer, inserting an active row if needed
    pub fn ensure(conn: &Connection, name: &str) -> Result<i64> {
        let name = name.trim();
        conn.execute(
            "INSERT OR IGNORE INTO manufacturers (name, is_active) VALUES (?1, 1)",
            [name],
        )
        .map_err(from_rusqlite)?;
        conn.query_row(
            "SELECT id FROM manufacturers WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    pub fn get(conn: &Connection, name: &str) -> Result<Option<Manufacturer>> {
        conn.query_row(
            "SELECT id, name, website_url, country, is_active FROM manufacturers WHERE name = ?1",
            [name],
            |row| {
                Ok(Manufacturer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    website_url: row.get(2)?,
                    country: row.get(3)?,
                    is_active: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Manufacturer>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, name, website_url, country, is_active FROM manufacturers ORDER BY name",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Manufacturer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    website_url: row.get(2)?,
                    country: row.get(3)?,
                    is_active: row.get(4)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// `NotFound` when no manufacturer has that name.
    pub fn set_active(conn: &Connection, name: &str, active: bool) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE manufacturers SET is_active = ?1, updated_at = CURRENT_TIMESTAMP
                 WHERE name = ?2",
                rusqlite::params![active, name],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found("set_manufacturer_active", name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use quiver_core::errors::ExErrorKind;

    fn setup_test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let conn = setup_test_db();
        let first = ManufacturerRepo::ensure(&conn, "Easton Archery").unwrap();
        let second = ManufacturerRepo::ensure(&conn, " Easton Archery ").unwrap();
        assert_eq!(first, second);
        assert_eq!(ManufacturerRepo::list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_set_active() {
        let conn = setup_test_db();
        ManufacturerRepo::ensure(&conn, "Gold Tip").unwrap();
        ManufacturerRepo::set_active(&conn, "Gold Tip", false).unwrap();
        assert!(!ManufacturerRepo::get(&conn, "Gold Tip").unwrap().unwrap().is_active);

        let err = ManufacturerRepo::set_active(&conn, "Nobody", true).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
