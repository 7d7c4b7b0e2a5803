//! Import processed extraction files into the catalog
//!
//! Each file is imported in its own transaction. A bad file is recorded in
//! the summary and the run moves on to the next one.

#![allow(clippy::result_large_err)]

use crate::document::{ArrowDocument, DEFAULT_MANUFACTURER};
use crate::errors::{from_rusqlite, io_error, not_found, Result};
use crate::repo::{ArrowRepo, ManufacturerRepo, UpsertOutcome};
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub arrows_inserted: usize,
    pub arrows_updated: usize,
    pub arrows_unchanged: usize,
    pub arrows_skipped: usize,
    pub specs_added: usize,
    pub errors: Vec<FileError>,
}

impl ImportSummary {
    pub fn arrows_imported(&self) -> usize {
        self.arrows_inserted + self.arrows_updated
    }

    fn absorb(&mut self, other: ImportSummary) {
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.files_failed += other.files_failed;
        self.arrows_inserted += other.arrows_inserted;
        self.arrows_updated += other.arrows_updated;
        self.arrows_unchanged += other.arrows_unchanged;
        self.arrows_skipped += other.arrows_skipped;
        self.specs_added += other.specs_added;
        self.errors.extend(other.errors);
    }
}

/// Sorted `*.json` files directly inside `dir`
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(not_found("import_directory", dir.display().to_string()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error("import_directory", e))? {
        let path = entry.map_err(|e| io_error("import_directory", e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Import every processed file in `dir`
///
/// # Errors
///
/// `NotFound` when `dir` is missing. Per-file failures are reported in the
/// summary instead.
pub fn import_directory(conn: &mut Connection, dir: &Path) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for path in json_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let document = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<ArrowDocument>(&text).map_err(|e| e.to_string()))
        {
            Ok(doc) => doc,
            Err(error) => {
                tracing::warn!(file = %name, %error, "skipping unreadable import file");
                summary.files_failed += 1;
                summary.errors.push(FileError { file: name, error });
                continue;
            }
        };

        if document.is_empty() {
            tracing::debug!(file = %name, "no arrows in file");
            summary.files_skipped += 1;
            continue;
        }

        match import_document(conn, &document) {
            Ok(file_summary) => {
                tracing::info!(
                    file = %name,
                    manufacturer = %document.manufacturer,
                    inserted = file_summary.arrows_inserted,
                    updated = file_summary.arrows_updated,
                    "file imported"
                );
                summary.absorb(file_summary);
            }
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "file import rolled back");
                summary.files_failed += 1;
                summary.errors.push(FileError {
                    file: name,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

/// Import one document in a single transaction
///
/// The document-level manufacturer wins over any per-arrow value.
pub fn import_document(conn: &mut Connection, document: &ArrowDocument) -> Result<ImportSummary> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let summary = import_into(&tx, document)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(summary)
}

fn import_into(tx: &Transaction<'_>, document: &ArrowDocument) -> Result<ImportSummary> {
    let manufacturer = match document.manufacturer.trim() {
        "" => DEFAULT_MANUFACTURER,
        name => name,
    };
    let mut summary = ImportSummary {
        files_processed: 1,
        ..ImportSummary::default()
    };
    ManufacturerRepo::ensure(tx, manufacturer)?;

    for arrow in &document.arrows {
        if let Some(reason) = arrow.rejection() {
            tracing::warn!(model_name = arrow.model_name(), reason, "skipping invalid arrow");
            summary.arrows_skipped += 1;
            continue;
        }

        let outcome = ArrowRepo::upsert_arrow(tx, manufacturer, arrow)?;
        match outcome {
            UpsertOutcome::Inserted(_) => summary.arrows_inserted += 1,
            UpsertOutcome::Updated(_) => summary.arrows_updated += 1,
            UpsertOutcome::Unchanged(_) => summary.arrows_unchanged += 1,
        }

        for spec in &arrow.spine_specifications {
            if ArrowRepo::add_spine_specification(tx, outcome.arrow_id(), spec)? {
                summary.specs_added += 1;
            }
        }
    }

    Ok(summary)
}
