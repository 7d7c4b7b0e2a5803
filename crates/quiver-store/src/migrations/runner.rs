//! Migration runner
//!
//! Orders pending migrations by dependency, applies each in its own
//! transaction and records the outcome in the ledger.

#![allow(clippy::result_large_err)]

use crate::db::backup_to;
use crate::errors::{checksum_mismatch, dependency_error, from_rusqlite, migration_error, not_found, Result};
use crate::migrations::builtin::builtin_migrations;
use crate::migrations::environment::Environment;
use crate::migrations::ledger::{self, LedgerEntry};
use crate::migrations::migration::Migration;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Highest version to apply
    pub target: Option<String>,
    pub dry_run: bool,
    /// Online backup written before anything is applied
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedMigration {
    pub version: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub would_apply: Vec<String>,
    pub failed: Option<FailedMigration>,
    pub backup_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn success(&self) -> bool {
        self.failed.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackReport {
    pub rolled_back: Vec<String>,
    pub would_roll_back: Vec<String>,
    pub failed: Option<FailedMigration>,
    pub dry_run: bool,
}

/// Static facts about a registered migration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationInfo {
    pub version: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub environments: Vec<String>,
    pub can_run: bool,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub environment: Environment,
    pub total: usize,
    pub applied_count: usize,
    pub pending_count: usize,
    pub applied: Vec<String>,
    pub pending: Vec<String>,
    pub last_migration: Option<String>,
    pub applied_details: Vec<LedgerEntry>,
    pub pending_details: Vec<MigrationInfo>,
    pub ledger_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationDetails {
    pub info: MigrationInfo,
    pub applied: bool,
    pub history: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequenceValidation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

/// Registered migrations plus the environment they run in
pub struct MigrationManager {
    migrations: Vec<Box<dyn Migration>>,
    environment: Environment,
}

impl MigrationManager {
    /// Manager over an explicit set; migrations are kept in version order
    pub fn new(mut migrations: Vec<Box<dyn Migration>>, environment: Environment) -> Self {
        migrations.sort_by(|a, b| a.version().cmp(b.version()));
        Self {
            migrations,
            environment,
        }
    }

    pub fn builtin(environment: Environment) -> Self {
        Self::new(builtin_migrations(), environment)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn migrations(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    fn find(&self, version: &str) -> Option<&dyn Migration> {
        self.migrations()
            .find(|m| m.version() == version)
    }

    fn info(&self, m: &dyn Migration) -> MigrationInfo {
        MigrationInfo {
            version: m.version().to_string(),
            description: m.description().to_string(),
            dependencies: m.dependencies().iter().map(|d| d.to_string()).collect(),
            environments: m.environments().describe(),
            can_run: m.can_run_in(self.environment),
            checksum: m.checksum(),
        }
    }

    /// Applied versions, oldest first
    pub fn applied_versions(&self, conn: &Connection) -> Result<Vec<String>> {
        Ok(ledger::applied_entries(conn)?
            .into_iter()
            .map(|e| e.version)
            .collect())
    }

    /// Runnable migrations not yet applied, in dependency order
    ///
    /// # Errors
    ///
    /// `DependencyCycle` when some migration's dependencies can never be met.
    pub fn pending(&self, conn: &Connection) -> Result<Vec<&dyn Migration>> {
        let applied: HashSet<String> = self.applied_versions(conn)?.into_iter().collect();

        let mut remaining: Vec<&dyn Migration> = self
            .migrations()
            .filter(|m| !applied.contains(m.version()) && m.can_run_in(self.environment))
            .collect();
        let mut resolved = applied;
        let mut ordered = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let before = remaining.len();
            let mut blocked = Vec::new();
            for m in remaining {
                if m.dependencies().iter().all(|d| resolved.contains(*d)) {
                    resolved.insert(m.version().to_string());
                    ordered.push(m);
                } else {
                    blocked.push(m);
                }
            }
            if blocked.len() == before {
                let mut edges = Vec::new();
                for m in &blocked {
                    for dep in m.dependencies() {
                        if !resolved.contains(*dep) {
                            edges.push(format!("{} -> {}", m.version(), dep));
                        }
                    }
                }
                return Err(dependency_error(&edges));
            }
            remaining = blocked;
        }
        Ok(ordered)
    }

    /// Apply pending migrations up to `options.target`
    ///
    /// A failing migration is rolled back, recorded with `success = 0` and
    /// stops the run; the failure is reported rather than returned as `Err`.
    ///
    /// # Errors
    ///
    /// Ledger, ordering or backup failures.
    pub fn migrate(&self, conn: &mut Connection, options: &MigrateOptions) -> Result<MigrationReport> {
        ledger::ensure_ledger(conn)?;

        let pending: Vec<&dyn Migration> = self
            .pending(conn)?
            .into_iter()
            .filter(|m| match &options.target {
                Some(target) => m.version() <= target.as_str(),
                None => true,
            })
            .collect();

        let mut report = MigrationReport {
            dry_run: options.dry_run,
            ..Default::default()
        };
        if pending.is_empty() {
            tracing::info!("no pending migrations");
            return Ok(report);
        }
        if options.dry_run {
            report.would_apply = pending.iter().map(|m| m.version().to_string()).collect();
            return Ok(report);
        }

        if let Some(path) = &options.backup_path {
            backup_to(conn, path)?;
            tracing::info!(path = %path.display(), "database backed up");
            report.backup_path = Some(path.clone());
        }

        with_foreign_keys_off(conn, |conn| {
            for m in &pending {
                let tx = conn.transaction().map_err(from_rusqlite)?;
                let outcome = m
                    .up(&tx)
                    .and_then(|()| ledger::record_success(&tx, *m, self.environment));
                match outcome {
                    Ok(()) => {
                        tx.commit().map_err(from_rusqlite)?;
                        tracing::info!(migration_version = m.version(), "migration applied");
                        report.applied.push(m.version().to_string());
                    }
                    Err(err) => {
                        tx.rollback().map_err(from_rusqlite)?;
                        let message = err.to_string();
                        ledger::record_failure(conn, *m, self.environment, &message)?;
                        tracing::warn!(
                            migration_version = m.version(),
                            error = %message,
                            "migration failed"
                        );
                        report.failed = Some(FailedMigration {
                            version: m.version().to_string(),
                            error: message,
                        });
                        break;
                    }
                }
            }
            Ok(())
        })?;

        Ok(report)
    }

    /// Undo every applied migration newer than `to_version`, newest first
    ///
    /// # Errors
    ///
    /// Ledger failures. A failing `down` is reported, not returned.
    pub fn rollback(&self, conn: &mut Connection, to_version: &str, dry_run: bool) -> Result<RollbackReport> {
        let mut targets = ledger::applied_entries(conn)?;
        targets.retain(|e| e.version.as_str() > to_version);
        targets.reverse();

        let mut report = RollbackReport {
            dry_run,
            ..Default::default()
        };
        if dry_run {
            report.would_roll_back = targets.into_iter().map(|e| e.version).collect();
            return Ok(report);
        }

        with_foreign_keys_off(conn, |conn| {
            for entry in &targets {
                let Some(m) = self.find(&entry.version) else {
                    report.failed = Some(FailedMigration {
                        version: entry.version.clone(),
                        error: format!("Migration {} is not registered", entry.version),
                    });
                    break;
                };
                let tx = conn.transaction().map_err(from_rusqlite)?;
                let outcome = m.down(&tx).and_then(|()| ledger::remove(&tx, m.version()));
                match outcome {
                    Ok(()) => {
                        tx.commit().map_err(from_rusqlite)?;
                        tracing::info!(migration_version = m.version(), "migration rolled back");
                        report.rolled_back.push(entry.version.clone());
                    }
                    Err(err) => {
                        tx.rollback().map_err(from_rusqlite)?;
                        tracing::warn!(migration_version = m.version(), error = %err, "rollback failed");
                        report.failed = Some(FailedMigration {
                            version: entry.version.clone(),
                            error: err.to_string(),
                        });
                        break;
                    }
                }
            }
            Ok(())
        })?;

        Ok(report)
    }

    pub fn status(&self, conn: &Connection) -> Result<MigrationStatus> {
        let ledger_exists = ledger::ledger_exists(conn)?;
        let applied_details = ledger::applied_entries(conn)?;
        let pending_details: Vec<MigrationInfo> = self
            .pending(conn)?
            .into_iter()
            .map(|m| self.info(m))
            .collect();

        let applied: Vec<String> = applied_details.iter().map(|e| e.version.clone()).collect();
        let pending: Vec<String> = pending_details.iter().map(|m| m.version.clone()).collect();

        Ok(MigrationStatus {
            environment: self.environment,
            total: self.migrations.len(),
            applied_count: applied.len(),
            pending_count: pending.len(),
            last_migration: applied.last().cloned(),
            applied,
            pending,
            applied_details,
            pending_details,
            ledger_exists,
        })
    }

    /// # Errors
    ///
    /// `NotFound` for an unregistered version.
    pub fn details(&self, conn: &Connection, version: &str) -> Result<MigrationDetails> {
        let m = self
            .find(version)
            .ok_or_else(|| not_found("migration_details", version))?;
        let history = ledger::history(conn, version)?;
        let applied = history.iter().any(|e| e.success);
        Ok(MigrationDetails {
            info: self.info(m),
            applied,
            history,
        })
    }

    pub fn validate_sequence(&self, conn: &Connection) -> Result<SequenceValidation> {
        let applied: HashSet<String> = self.applied_versions(conn)?.into_iter().collect();
        let known: HashSet<&str> = self.migrations().map(|m| m.version()).collect();

        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        for m in self.migrations() {
            for dep in m.dependencies() {
                if !known.contains(dep) && !applied.contains(*dep) {
                    issues.push(format!(
                        "Migration {} depends on missing migration {}",
                        m.version(),
                        dep
                    ));
                } else if !applied.contains(*dep) && !applied.contains(m.version()) {
                    warnings.push(format!(
                        "Migration {} depends on {}, which is not applied yet",
                        m.version(),
                        dep
                    ));
                }
            }
        }

        let blocked: Vec<&str> = self
            .migrations()
            .filter(|m| !m.can_run_in(self.environment))
            .map(|m| m.version())
            .collect();
        if !blocked.is_empty() {
            warnings.push(format!(
                "Migrations not runnable in {}: [{}]",
                self.environment,
                blocked.join(", ")
            ));
        }

        Ok(SequenceValidation {
            valid: issues.is_empty(),
            issues,
            warnings,
        })
    }

    /// # Errors
    ///
    /// `ChecksumMismatch` for the first applied migration whose registered
    /// checksum differs from the ledger.
    pub fn verify_checksums(&self, conn: &Connection) -> Result<()> {
        for entry in ledger::applied_entries(conn)? {
            if let Some(m) = self.find(&entry.version) {
                let expected = m.checksum();
                if expected != entry.checksum {
                    return Err(checksum_mismatch(&entry.version, &expected, &entry.checksum));
                }
            }
        }
        Ok(())
    }
}

/// Run `f` with foreign key enforcement off, restoring the previous setting
fn with_foreign_keys_off<F>(conn: &mut Connection, f: F) -> Result<()>
where
    F: FnOnce(&mut Connection) -> Result<()>,
{
    let enabled: bool = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .map_err(from_rusqlite)?;
    conn.pragma_update(None, "foreign_keys", "OFF")
        .map_err(from_rusqlite)?;
    let result = f(conn);
    if enabled {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(from_rusqlite)?;
    }
    result
}

/// Apply every pending built-in migration without a backup
///
/// # Errors
///
/// `MigrationFailed` naming the first migration that failed.
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let manager = MigrationManager::builtin(Environment::detect());
    let report = manager.migrate(conn, &MigrateOptions::default())?;
    match report.failed {
        Some(failed) => Err(migration_error(&failed.version, &failed.error)),
        None => Ok(()),
    }
}

/// `{db}.backup_{YYYYmmdd_HHMMSS}` next to the database
pub fn backup_path_for(db_path: &Path, now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!(
        "{}.backup_{}",
        db_path.display(),
        now.format("%Y%m%d_%H%M%S")
    ))
}
