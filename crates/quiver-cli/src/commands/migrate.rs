//! Migration commands

use super::{db_path, open_db, or_na, CmdResult};
use crate::settings::Settings;
use clap::{Args, Subcommand};
use quiver_engine::commands::migrate::{
    migrate_details, migrate_rollback, migrate_status, migrate_up, migrate_validate,
};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,

    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply pending migrations
    Up {
        /// Highest version to apply
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        dry_run: bool,
        /// Skip the pre-migration backup
        #[arg(long)]
        no_backup: bool,
    },
    /// Applied and pending migrations
    Status,
    /// Roll back everything newer than a version
    Rollback {
        version: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Check ordering, dependencies and checksums
    Validate,
    /// Show one migration
    Details { version: String },
}

pub fn execute(args: MigrateArgs, settings: &Settings) -> CmdResult {
    let path = db_path(args.db, settings);
    let mut conn = open_db(&path)?;

    match args.command {
        MigrateCommand::Up {
            target,
            dry_run,
            no_backup,
        } => {
            let report = migrate_up(&mut conn, Some(&path), target, dry_run, !no_backup)?;
            if report.dry_run {
                println!("Dry run: {} migration(s) would be applied", report.would_apply.len());
                for version in &report.would_apply {
                    println!("  - {}", version);
                }
                return Ok(());
            }
            if let Some(backup) = &report.backup_path {
                println!("Backup written to {}", backup.display());
            }
            if report.applied.is_empty() && report.failed.is_none() {
                println!("✓ Database is up to date");
            }
            for version in &report.applied {
                println!("✓ Applied {}", version);
            }
            if let Some(failed) = report.failed {
                return Err(format!("migration {} failed: {}", failed.version, failed.error).into());
            }
        }
        MigrateCommand::Status => {
            let status = migrate_status(&conn)?;
            println!("Environment: {}", status.environment);
            println!("Applied: {}/{}", status.applied_count, status.total);
            println!("Pending: {}", status.pending_count);
            println!("Last migration: {}", or_na(status.last_migration));
            for info in &status.pending_details {
                let note = if info.can_run { "" } else { " (not for this environment)" };
                println!("  - {} {}{}", info.version, info.description, note);
            }
        }
        MigrateCommand::Rollback { version, dry_run } => {
            let report = migrate_rollback(&mut conn, &version, dry_run)?;
            if report.dry_run {
                println!(
                    "Dry run: {} migration(s) would be rolled back",
                    report.would_roll_back.len()
                );
                for v in &report.would_roll_back {
                    println!("  - {}", v);
                }
                return Ok(());
            }
            if report.rolled_back.is_empty() && report.failed.is_none() {
                println!("Nothing to roll back");
            }
            for v in &report.rolled_back {
                println!("✓ Rolled back {}", v);
            }
            if let Some(failed) = report.failed {
                return Err(format!("rollback of {} failed: {}", failed.version, failed.error).into());
            }
        }
        MigrateCommand::Validate => {
            let validation = migrate_validate(&conn)?;
            for warning in &validation.warnings {
                println!("warning: {}", warning);
            }
            if !validation.valid {
                for issue in &validation.issues {
                    println!("issue: {}", issue);
                }
                return Err(format!(
                    "migration validation found {} issue(s)",
                    validation.issues.len()
                )
                .into());
            }
            println!("✓ Migrations are valid");
        }
        MigrateCommand::Details { version } => {
            let details = migrate_details(&conn, &version)?;
            let info = &details.info;
            println!("Version: {}", info.version);
            println!("Description: {}", info.description);
            println!("Dependencies: {}", info.dependencies.join(", "));
            println!("Environments: {}", info.environments.join(", "));
            println!("Checksum: {}", info.checksum);
            println!("Applied: {}", if details.applied { "yes" } else { "no" });
            for entry in &details.history {
                let outcome = if entry.success { "ok" } else { "failed" };
                println!(
                    "  {} by {} ({})",
                    entry.applied_at, entry.applied_by, outcome
                );
            }
        }
    }

    Ok(())
}
