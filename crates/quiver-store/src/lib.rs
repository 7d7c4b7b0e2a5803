//! Quiver Store - SQLite persistence for the arrow catalog
//!
//! Provides:
//! - Connection setup (foreign keys, WAL, busy timeout) and online backup
//! - Versioned migration framework with a ledger and rollback
//! - Repositories for arrows, manufacturers and validation results
//! - Import of processed extraction files

pub mod db;
pub mod document;
pub mod errors;
pub mod import;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use document::{ArrowDocument, ImportedArrow, ImportedSpec};
pub use errors::Result;
pub use import::{import_directory, import_document, ImportSummary};
