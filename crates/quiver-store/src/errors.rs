//! Error handling for quiver-store
//!
//! Wraps quiver-core ExError with store-specific helpers

use quiver_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(version: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::MigrationFailed)
        .with_op("migration")
        .with_entity_id(version)
        .with_message(format!("Migration {} failed: {}", version, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(version: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ChecksumMismatch)
        .with_op("migration_checksum")
        .with_entity_id(version)
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            version, expected, actual
        ))
}

/// Create an unresolvable dependency error
pub fn dependency_error(unresolved: &[String]) -> ExError {
    ExError::new(ExErrorKind::DependencyCycle)
        .with_op("migration_order")
        .with_message(format!(
            "Circular dependency or missing migrations: [{}]",
            unresolved.join(", ")
        ))
}

/// Create an import error for one file or document
pub fn import_error(source: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("import")
        .with_entity_id(source)
        .with_message(reason.to_string())
}

/// Create a not-found error for an entity
pub fn not_found(op: &str, entity_id: impl Into<String>) -> ExError {
    let entity_id = entity_id.into();
    ExError::new(ExErrorKind::NotFound)
        .with_op(op.to_string())
        .with_message(format!("{} not found", entity_id))
        .with_entity_id(entity_id)
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a serialization error from serde_json::Error
pub fn json_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
