//! Migration framework
//!
//! Provides:
//! - Versioned migrations (embedded SQL pairs and programmatic Rust)
//! - Dependency ordering and environment scoping
//! - A ledger with checksums, failure records and rollback
//! - Schema helpers for column additions and table rebuilds

mod builtin;
mod checksums;
pub mod ddl;
mod embedded;
pub mod environment;
pub mod ledger;
pub mod migration;
mod runner;

pub use builtin::builtin_migrations;
pub use checksums::{compute_checksum, migration_checksum};
pub use environment::{Environment, EnvironmentScope};
pub use ledger::LedgerEntry;
pub use migration::{Migration, SqlMigration};
pub use runner::{
    apply_migrations, backup_path_for, FailedMigration, MigrateOptions, MigrationDetails,
    MigrationInfo, MigrationManager, MigrationReport, MigrationStatus, RollbackReport,
    SequenceValidation,
};
