//! Data validation commands

use super::{db_path, open_catalog, or_na, CmdResult};
use crate::settings::Settings;
use clap::{Args, Subcommand};
use quiver_engine::commands::validate::{
    apply_fix, mark_not_duplicate, validate_all, validation_history,
};
use quiver_engine::validator::sql_fix_script;
use quiver_engine::ValidationReport;
use quiver_store::repo::{IssueFilter, ValidationRepo};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(subcommand)]
    pub command: ValidateCommand,

    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ValidateCommand {
    /// Run every check
    Run {
        /// Store the run and its issues
        #[arg(long)]
        persist: bool,
        /// Print every issue, not just the summary
        #[arg(long)]
        verbose: bool,
    },
    /// Recent stored runs
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Unresolved stored issues
    Issues {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        fixable: bool,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Apply the stored SQL fix for an issue
    Fix {
        issue_id: i64,
        #[arg(long, default_value = "cli")]
        applied_by: String,
    },
    /// Print a SQL script with every automatic fix
    Script,
    /// Record that two arrows are not duplicates
    NotDuplicate {
        arrow_a: i64,
        arrow_b: i64,
        #[arg(long)]
        reason: Option<String>,
    },
}

pub fn execute(args: ValidateArgs, settings: &Settings) -> CmdResult {
    let conn = open_catalog(&db_path(args.db, settings))?;

    match args.command {
        ValidateCommand::Run { persist, verbose } => {
            let report = validate_all(&conn, "manual", persist)?;
            print_report(&report, verbose);
        }
        ValidateCommand::History { limit } => {
            let runs = validation_history(&conn, limit)?;
            if runs.is_empty() {
                println!("No validation runs recorded");
            }
            for run in &runs {
                println!(
                    "[{}] {} | {} issue(s): {} critical, {} warning, {} info | health {:.1} | {} arrows | {}",
                    run.id,
                    or_na(run.run_timestamp.as_deref()),
                    run.total_issues,
                    run.critical_issues,
                    run.warning_issues,
                    run.info_issues,
                    run.health_score,
                    run.total_arrows_checked,
                    run.triggered_by
                );
            }
        }
        ValidateCommand::Issues {
            category,
            severity,
            fixable,
            limit,
        } => {
            let filter = IssueFilter {
                category,
                severity,
                auto_fixable_only: fixable,
                limit: Some(limit),
            };
            let issues = ValidationRepo::open_issues(&conn, &filter)?;
            println!("{} open issue(s)", issues.len());
            for issue in &issues {
                let fix = if issue.auto_fixable { " [fixable]" } else { "" };
                println!(
                    "[{}] {} {} | arrow {} | {} (seen {}x){}",
                    issue.id,
                    issue.severity,
                    issue.category,
                    or_na(issue.arrow_id),
                    issue.issue_description,
                    issue.occurrence_count,
                    fix
                );
            }
        }
        ValidateCommand::Fix {
            issue_id,
            applied_by,
        } => {
            let outcome = apply_fix(&conn, issue_id, &applied_by)?;
            if !outcome.success {
                return Err(format!(
                    "fix for issue {} failed: {}",
                    issue_id,
                    outcome.error_message.unwrap_or_default()
                )
                .into());
            }
            println!("✓ Applied fix {} for issue {}", outcome.fix_id, issue_id);
        }
        ValidateCommand::Script => {
            let report = validate_all(&conn, "manual", false)?;
            print!("{}", sql_fix_script(&report));
        }
        ValidateCommand::NotDuplicate {
            arrow_a,
            arrow_b,
            reason,
        } => {
            let added = mark_not_duplicate(&conn, arrow_a, arrow_b, reason.as_deref(), "cli")?;
            if added {
                println!("✓ Arrows {} and {} are no longer reported as duplicates", arrow_a, arrow_b);
            } else {
                println!("Arrows {} and {} were already excluded", arrow_a, arrow_b);
            }
        }
    }

    Ok(())
}

fn print_report(report: &ValidationReport, verbose: bool) {
    println!("Arrows checked: {}", report.total_arrows);
    println!("Health score: {:.1}/100", report.health_score);
    println!(
        "Issues: {} ({} critical, {} warning, {} info)",
        report.total_issues, report.critical, report.warning, report.info
    );
    for count in &report.issues_by_category {
        if count.count > 0 {
            println!("  {}: {}", count.category, count.count);
        }
    }
    println!(
        "Spine coverage: {}/{} arrows ({:.1}%)",
        report.spine_coverage.arrows_with_specs,
        report.spine_coverage.total_arrows,
        report.spine_coverage.coverage_percentage
    );
    if let Some(run_id) = report.run_id {
        println!("✓ Stored as run {}", run_id);
    }
    if verbose {
        for issue in &report.issues {
            println!(
                "[{}] {} | arrow {} | {}: {}",
                issue.severity,
                issue.category,
                or_na(issue.arrow_id),
                issue.field,
                issue.issue
            );
        }
    }
    println!("Recommendations:");
    for line in report.recommendations() {
        println!("  - {}", line);
    }
}
