//! Programmatic migrations: column additions, table rebuilds and backfills

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::migrations::ddl::{add_column_if_missing, drop_column, recreate_table};
use crate::migrations::embedded::sql_migrations;
use crate::migrations::migration::Migration;
use rusqlite::Transaction;

/// Every registered migration, SQL first, in version order
pub fn builtin_migrations() -> Vec<Box<dyn Migration>> {
    let mut migrations: Vec<Box<dyn Migration>> = sql_migrations()
        .into_iter()
        .map(|m| Box::new(m) as Box<dyn Migration>)
        .collect();
    migrations.push(Box::new(ArrowCatalogColumns));
    migrations.push(Box::new(BowSetupTuningColumns));
    migrations.push(Box::new(RelaxSetupArrowsUniqueness));
    migrations.push(Box::new(BackfillManufacturers));
    migrations
}

/// Add each column if missing; returns how many were added
fn add_columns(tx: &Transaction<'_>, table: &str, columns: &[(&str, &str)]) -> Result<usize> {
    let mut added = 0;
    for (column, declaration) in columns {
        if add_column_if_missing(tx, table, column, declaration)? {
            added += 1;
        }
    }
    Ok(added)
}

fn drop_columns(tx: &Transaction<'_>, table: &str, columns: &[(&str, &str)]) -> Result<()> {
    for (column, _) in columns.iter().rev() {
        drop_column(tx, table, column)?;
    }
    Ok(())
}

const ARROW_CATALOG_COLUMNS: &[(&str, &str)] = &[
    ("recommended_use", "TEXT"),
    ("price_range", "TEXT"),
    ("availability", "TEXT"),
    ("scraper_version", "TEXT"),
    ("source_url", "TEXT"),
];

pub struct ArrowCatalogColumns;

impl Migration for ArrowCatalogColumns {
    fn version(&self) -> &str {
        "008"
    }

    fn description(&self) -> &str {
        "Arrow catalog columns"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["001"]
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        let added = add_columns(tx, "arrows", ARROW_CATALOG_COLUMNS)?;
        tracing::debug!(added, "arrow catalog columns");
        Ok(())
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        drop_columns(tx, "arrows", ARROW_CATALOG_COLUMNS)
    }
}

const BOW_SETUP_COLUMNS: &[(&str, &str)] = &[
    ("draw_length", "REAL DEFAULT 28.0"),
    ("wood_species", "TEXT"),
    ("shooting_style", "TEXT DEFAULT 'standard'"),
    ("nock_weight", "REAL"),
    ("fletching_weight", "REAL"),
    ("insert_weight", "REAL"),
];

pub struct BowSetupTuningColumns;

impl Migration for BowSetupTuningColumns {
    fn version(&self) -> &str {
        "009"
    }

    fn description(&self) -> &str {
        "Bow setup tuning columns"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["003"]
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        let added = add_columns(tx, "bow_setups", BOW_SETUP_COLUMNS)?;
        tracing::debug!(added, "bow setup tuning columns");
        Ok(())
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        drop_columns(tx, "bow_setups", BOW_SETUP_COLUMNS)
    }
}

const SETUP_ARROW_COLUMNS: &[&str] = &[
    "id",
    "setup_id",
    "arrow_id",
    "arrow_length",
    "point_weight",
    "calculated_spine",
    "notes",
    "created_at",
];

fn setup_arrows_ddl(unique: bool) -> String {
    format!(
        "CREATE TABLE setup_arrows_new (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            setup_id INTEGER NOT NULL,
            arrow_id INTEGER NOT NULL,
            arrow_length REAL NOT NULL,
            point_weight REAL NOT NULL,
            calculated_spine INTEGER,
            notes TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (setup_id) REFERENCES bow_setups(id) ON DELETE CASCADE,
            FOREIGN KEY (arrow_id) REFERENCES arrows(id){}
        )",
        if unique {
            ",\n            UNIQUE(setup_id, arrow_id)"
        } else {
            ""
        }
    )
}

/// Lets one setup hold the same shaft at several lengths or point weights
pub struct RelaxSetupArrowsUniqueness;

impl Migration for RelaxSetupArrowsUniqueness {
    fn version(&self) -> &str {
        "010"
    }

    fn description(&self) -> &str {
        "Relax setup arrows uniqueness"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["003"]
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        recreate_table(tx, "setup_arrows", &setup_arrows_ddl(false), SETUP_ARROW_COLUMNS)?;
        tx.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_setup_arrows_setup_id ON setup_arrows(setup_id);
             CREATE INDEX IF NOT EXISTS idx_setup_arrows_lookup
                 ON setup_arrows(setup_id, arrow_id, arrow_length, point_weight);",
        )
        .map_err(from_rusqlite)
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        recreate_table(tx, "setup_arrows", &setup_arrows_ddl(true), SETUP_ARROW_COLUMNS)?;
        tx.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_setup_arrows_setup_id ON setup_arrows(setup_id);",
        )
        .map_err(from_rusqlite)
    }
}

/// Registers every manufacturer that appears in the arrow catalog
pub struct BackfillManufacturers;

impl Migration for BackfillManufacturers {
    fn version(&self) -> &str {
        "011"
    }

    fn description(&self) -> &str {
        "Backfill manufacturers from arrows"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["001", "002"]
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO manufacturers (name)
                 SELECT DISTINCT TRIM(manufacturer) FROM arrows
                 WHERE manufacturer IS NOT NULL AND TRIM(manufacturer) != ''",
                [],
            )
            .map_err(from_rusqlite)?;
        tracing::debug!(inserted, "manufacturers backfilled");
        Ok(())
    }

    fn down(&self, _tx: &Transaction<'_>) -> Result<()> {
        // Backfilled rows are indistinguishable from registered ones
        Ok(())
    }
}
