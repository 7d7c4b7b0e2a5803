//! Repository layer over the catalog, manufacturer and validation tables

pub mod arrow_repo;
pub mod manufacturer_repo;
pub mod validation_repo;

pub use arrow_repo::{
    spine_display, ArrowRepo, ArrowSummary, DatabaseStatistics, SearchQuery, UpsertOutcome,
};
pub use manufacturer_repo::{Manufacturer, ManufacturerRepo};
pub use validation_repo::{
    FixAttempt, FixMethod, IssueFilter, NewIssue, PersistOutcome, RunTotals, StoredIssue,
    ValidationRepo, ValidationRun,
};
