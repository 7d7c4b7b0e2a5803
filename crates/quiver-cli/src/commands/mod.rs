//! Subcommand implementations

pub mod calc;
pub mod catalog;
pub mod migrate;
pub mod scrape;
pub mod validate;

use crate::settings::Settings;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// `--db` when given, otherwise the configured database path
pub fn db_path(db: Option<PathBuf>, settings: &Settings) -> PathBuf {
    db.unwrap_or_else(|| settings.database_path.clone())
}

/// Open the database file, creating its directory if needed
pub fn open_db(path: &Path) -> Result<Connection, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(quiver_store::db::open(path)?)
}

/// Open the catalog with every pending migration applied
pub fn open_catalog(path: &Path) -> Result<Connection, Box<dyn std::error::Error>> {
    let mut conn = open_db(path)?;
    quiver_store::migrations::apply_migrations(&mut conn)?;
    Ok(conn)
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}
