//! Schema migration commands.
//!
//! ## Logging Ownership
//!
//! These wrappers log the command lifecycle. Per-migration progress is
//! logged by the store runner.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use quiver_core::{log_op_end, log_op_error, log_op_start};
use quiver_store::errors::Result;
use quiver_store::migrations::{
    backup_path_for, Environment, MigrateOptions, MigrationDetails, MigrationManager,
    MigrationReport, MigrationStatus, RollbackReport, SequenceValidation,
};
use rusqlite::Connection;
use std::path::Path;

/// Apply pending migrations
///
/// ## Arguments
///
/// - `conn`: Database connection
/// - `db_path`: File backing `conn`; a timestamped backup is written next to
///   it unless `backup` is false or this is a dry run
/// - `target`: Highest version to apply
///
/// ## Returns
///
/// What was applied, or would be applied on a dry run. A failing migration
/// is reported in `failed` and stops the run.
///
/// ## Errors
///
/// - `DependencyCycle`: Pending migrations cannot be ordered
/// - `Persistence`: Ledger or backup failure
pub fn migrate_up(
    conn: &mut Connection,
    db_path: Option<&Path>,
    target: Option<String>,
    dry_run: bool,
    backup: bool,
) -> Result<MigrationReport> {
    log_op_start!("migrate_up", dry_run = dry_run, target = ?target);
    let start = std::time::Instant::now();

    let manager = MigrationManager::builtin(Environment::detect());
    let options = MigrateOptions {
        target,
        dry_run,
        backup_path: db_path
            .filter(|_| backup && !dry_run)
            .map(|path| backup_path_for(path, Utc::now())),
    };

    let report = manager.migrate(conn, &options).map_err(|e| {
        log_op_error!(
            "migrate_up",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "migrate_up",
        duration_ms = start.elapsed().as_millis() as u64,
        applied = report.applied.len(),
        failed = report.failed.is_some()
    );
    Ok(report)
}

/// Roll back every applied migration newer than `to_version`
///
/// ## Errors
///
/// - `Persistence`: Ledger failure
pub fn migrate_rollback(
    conn: &mut Connection,
    to_version: &str,
    dry_run: bool,
) -> Result<RollbackReport> {
    log_op_start!("migrate_rollback", to_version = to_version, dry_run = dry_run);
    let start = std::time::Instant::now();

    let manager = MigrationManager::builtin(Environment::detect());
    let report = manager.rollback(conn, to_version, dry_run).map_err(|e| {
        log_op_error!(
            "migrate_rollback",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "migrate_rollback",
        duration_ms = start.elapsed().as_millis() as u64,
        rolled_back = report.rolled_back.len(),
        failed = report.failed.is_some()
    );
    Ok(report)
}

pub fn migrate_status(conn: &Connection) -> Result<MigrationStatus> {
    MigrationManager::builtin(Environment::detect()).status(conn)
}

pub fn migrate_details(conn: &Connection, version: &str) -> Result<MigrationDetails> {
    MigrationManager::builtin(Environment::detect()).details(conn, version)
}

/// Check ordering and stored checksums
///
/// Checksum drift is folded into the returned issues.
pub fn migrate_validate(conn: &Connection) -> Result<SequenceValidation> {
    log_op_start!("migrate_validate");
    let start = std::time::Instant::now();

    let manager = MigrationManager::builtin(Environment::detect());
    let result = manager.validate_sequence(conn).map(|mut validation| {
        if let Err(e) = manager.verify_checksums(conn) {
            validation.valid = false;
            validation.issues.push(e.message().to_string());
        }
        validation
    });
    let validation = result.map_err(|e| {
        log_op_error!(
            "migrate_validate",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "migrate_validate",
        duration_ms = start.elapsed().as_millis() as u64,
        valid = validation.valid
    );
    Ok(validation)
}
