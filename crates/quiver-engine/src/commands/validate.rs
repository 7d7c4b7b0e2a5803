//! Validation commands: run checks, persist results and apply fixes.
//!
//! ## Logging Ownership
//!
//! Each public function logs its own lifecycle. Checks emit one `debug!`
//! per category.

#![allow(clippy::result_large_err)]

use crate::validator::{DataValidator, ValidationReport};
use quiver_core::errors::{ExError, ExErrorKind};
use quiver_core::{log_op_end, log_op_error, log_op_start};
use quiver_store::errors::{from_rusqlite, not_found, Result};
use quiver_store::repo::{FixAttempt, FixMethod, RunTotals, ValidationRepo, ValidationRun};
use rusqlite::Connection;
use serde::Serialize;

/// Result of applying one stored fix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixOutcome {
    pub issue_id: i64,
    pub fix_id: i64,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Run every check and optionally store the run
///
/// ## Arguments
///
/// - `conn`: Database connection
/// - `triggered_by`: Recorded on the stored run, e.g. `manual` or `update`
/// - `persist`: Store the run and its issues; the returned report then
///   carries `run_id`
///
/// ## Errors
///
/// - `Persistence`: A check query or the run ledger failed. A stored run is
///   closed with zero totals before the error is returned.
pub fn validate_all(conn: &Connection, triggered_by: &str, persist: bool) -> Result<ValidationReport> {
    log_op_start!("validate_all", triggered_by = triggered_by, persist = persist);
    let start = std::time::Instant::now();

    let report = validate_all_impl(conn, triggered_by, persist, start).map_err(|e| {
        log_op_error!(
            "validate_all",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "validate_all",
        duration_ms = start.elapsed().as_millis() as u64,
        total_issues = report.total_issues,
        critical = report.critical,
        health_score = report.health_score
    );
    Ok(report)
}

fn validate_all_impl(
    conn: &Connection,
    triggered_by: &str,
    persist: bool,
    start: std::time::Instant,
) -> Result<ValidationReport> {
    if !persist {
        return DataValidator::new(conn).run();
    }

    let run_id = ValidationRepo::start_run(conn, triggered_by)?;
    let mut report = match DataValidator::new(conn).run() {
        Ok(report) => report,
        Err(e) => {
            let empty = RunTotals {
                duration_ms: start.elapsed().as_millis() as u64,
                ..RunTotals::default()
            };
            if let Err(close) = ValidationRepo::complete_run(conn, run_id, &empty) {
                tracing::warn!(run_id, error = %close, "could not close failed validation run");
            }
            return Err(e);
        }
    };

    let new_issues: Vec<_> = report.issues.iter().map(|i| i.to_new_issue()).collect();
    let outcome = ValidationRepo::persist_issues(conn, run_id, &new_issues)?;
    ValidationRepo::complete_run(conn, run_id, &report.totals(start.elapsed().as_millis() as u64))?;
    tracing::debug!(
        run_id,
        inserted = outcome.inserted,
        recurring = outcome.recurring,
        "validation run stored"
    );

    report.run_id = Some(run_id);
    Ok(report)
}

/// Execute the stored SQL fix for an issue
///
/// The statement runs in its own transaction. On success the issue is
/// resolved; on failure the transaction is rolled back and the failed
/// attempt is still recorded.
///
/// ## Returns
///
/// The recorded attempt. A failing statement is not an error: check
/// `success` and `error_message`.
///
/// ## Errors
///
/// - `NotFound`: No issue has that id
/// - `InvalidInput`: The issue is resolved or has no executable fix
pub fn apply_fix(conn: &Connection, issue_id: i64, applied_by: &str) -> Result<FixOutcome> {
    log_op_start!("apply_fix", issue_id = issue_id);
    let start = std::time::Instant::now();

    let outcome = apply_fix_impl(conn, issue_id, applied_by).map_err(|e| {
        log_op_error!(
            "apply_fix",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "apply_fix",
        duration_ms = start.elapsed().as_millis() as u64,
        success = outcome.success
    );
    Ok(outcome)
}

fn rejected(issue_id: i64, message: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("apply_fix")
        .with_entity_id(issue_id.to_string())
        .with_message(message.to_string())
}

fn apply_fix_impl(conn: &Connection, issue_id: i64, applied_by: &str) -> Result<FixOutcome> {
    let issue = ValidationRepo::get_issue(conn, issue_id)?
        .ok_or_else(|| not_found("apply_fix", issue_id.to_string()))?;
    if issue.is_resolved {
        return Err(rejected(issue_id, "Issue is already resolved"));
    }
    if !issue.auto_fixable {
        return Err(rejected(issue_id, "Issue has no automatic fix"));
    }
    let sql = issue
        .sql_fix
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| rejected(issue_id, "Issue has no SQL fix"))?;

    let description = Some(format!("{}: {}", issue.category, issue.issue_description));
    let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;
    match tx.execute_batch(&sql) {
        Ok(()) => {
            let fix_id = ValidationRepo::record_fix(
                &tx,
                issue_id,
                &FixAttempt {
                    method: FixMethod::Automated,
                    description,
                    sql_executed: Some(sql),
                    success: true,
                    error_message: None,
                    applied_by: applied_by.to_string(),
                },
            )?;
            ValidationRepo::resolve_issue(&tx, issue_id, applied_by)?;
            tx.commit().map_err(from_rusqlite)?;
            Ok(FixOutcome {
                issue_id,
                fix_id,
                success: true,
                error_message: None,
            })
        }
        Err(e) => {
            tx.rollback().map_err(from_rusqlite)?;
            let message = e.to_string();
            tracing::warn!(issue_id, error = %message, "fix statement failed");
            let fix_id = ValidationRepo::record_fix(
                conn,
                issue_id,
                &FixAttempt {
                    method: FixMethod::Automated,
                    description,
                    sql_executed: Some(sql),
                    success: false,
                    error_message: Some(message.clone()),
                    applied_by: applied_by.to_string(),
                },
            )?;
            Ok(FixOutcome {
                issue_id,
                fix_id,
                success: false,
                error_message: Some(message),
            })
        }
    }
}

/// Stop reporting two arrows as duplicates of each other
///
/// Returns false when the pair was already excluded.
pub fn mark_not_duplicate(
    conn: &Connection,
    arrow_a: i64,
    arrow_b: i64,
    reason: Option<&str>,
    created_by: &str,
) -> Result<bool> {
    if arrow_a == arrow_b {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("mark_not_duplicate")
            .with_entity_id(arrow_a.to_string())
            .with_message("An arrow cannot be paired with itself"));
    }
    let added = ValidationRepo::exclude_duplicate_pair(conn, arrow_a, arrow_b, reason, created_by)?;
    tracing::info!(arrow_a, arrow_b, added, "duplicate exclusion");
    Ok(added)
}

pub fn validation_history(conn: &Connection, limit: usize) -> Result<Vec<ValidationRun>> {
    ValidationRepo::history(conn, limit)
}
