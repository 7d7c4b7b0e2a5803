//! Quiver Engine - Orchestration layer
//!
//! Coordinates the calculators in quiver-core, the catalog in quiver-store
//! and the scraper. Every public command owns its lifecycle logging.

pub mod commands;
pub mod validator;

pub use validator::{DataValidator, Severity, ValidationIssue, ValidationReport};
