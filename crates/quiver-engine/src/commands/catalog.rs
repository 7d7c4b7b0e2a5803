//! Catalog commands: import, search, details and statistics.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for catalog operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store only emits `tracing::debug!()` for row-level detail.

#![allow(clippy::result_large_err)]

use quiver_core::model::ArrowRecord;
use quiver_core::{log_op_end, log_op_error, log_op_start};
use quiver_store::errors::{not_found, Result};
use quiver_store::import::{import_directory, ImportSummary};
use quiver_store::repo::{ArrowRepo, ArrowSummary, DatabaseStatistics, SearchQuery};
use rusqlite::Connection;
use std::path::Path;

/// Import every processed extraction file in `dir`
///
/// ## Arguments
///
/// - `conn`: Database connection
/// - `dir`: Directory holding `*_arrows.json` files
///
/// ## Returns
///
/// Totals across all files; unreadable files are listed in `errors`.
///
/// ## Errors
///
/// - `NotFound`: `dir` does not exist
/// - `Persistence`: Database error outside a single file
pub fn import_processed(conn: &mut Connection, dir: &Path) -> Result<ImportSummary> {
    let dir_display = dir.display().to_string();
    log_op_start!("import_processed", dir = %dir_display);
    let start = std::time::Instant::now();

    let summary = import_directory(conn, dir).map_err(|e| {
        log_op_error!(
            "import_processed",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "import_processed",
        duration_ms = start.elapsed().as_millis() as u64,
        files_processed = summary.files_processed,
        files_failed = summary.files_failed,
        arrows_imported = summary.arrows_imported()
    );
    Ok(summary)
}

pub fn search_arrows(conn: &Connection, query: &SearchQuery) -> Result<Vec<ArrowSummary>> {
    log_op_start!("search_arrows");
    let start = std::time::Instant::now();

    let hits = ArrowRepo::search(conn, query).map_err(|e| {
        log_op_error!(
            "search_arrows",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "search_arrows",
        duration_ms = start.elapsed().as_millis() as u64,
        hits = hits.len()
    );
    Ok(hits)
}

/// Arrow with all spine specifications
///
/// ## Errors
///
/// - `NotFound`: No arrow has that id
pub fn arrow_details(conn: &Connection, arrow_id: i64) -> Result<ArrowRecord> {
    log_op_start!("arrow_details", arrow_id = arrow_id);
    let start = std::time::Instant::now();

    let result = ArrowRepo::get_details(conn, arrow_id)
        .and_then(|found| found.ok_or_else(|| not_found("arrow_details", arrow_id.to_string())))
        .map_err(|e| {
            log_op_error!(
                "arrow_details",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "arrow_details",
        duration_ms = start.elapsed().as_millis() as u64,
        spine_count = result.spine_specifications.len()
    );
    Ok(result)
}

pub fn catalog_statistics(conn: &Connection) -> Result<DatabaseStatistics> {
    log_op_start!("catalog_statistics");
    let start = std::time::Instant::now();

    let stats = ArrowRepo::statistics(conn).map_err(|e| {
        log_op_error!(
            "catalog_statistics",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "catalog_statistics",
        duration_ms = start.elapsed().as_millis() as u64,
        total_arrows = stats.total_arrows
    );
    Ok(stats)
}
