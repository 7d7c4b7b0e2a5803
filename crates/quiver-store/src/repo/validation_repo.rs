//! Validation runs, issues and fix attempts

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashSet;

/// An issue found by a validation run, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub issue_hash: String,
    pub category: String,
    pub severity: String,
    pub arrow_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub field: Option<String>,
    pub issue_description: String,
    pub current_value: Option<String>,
    pub suggested_fix: Option<String>,
    pub sql_fix: Option<String>,
    pub auto_fixable: bool,
}

/// A persisted `validation_issues` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredIssue {
    pub id: i64,
    pub run_id: i64,
    pub issue_hash: String,
    pub category: String,
    pub severity: String,
    pub arrow_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub field: Option<String>,
    pub issue_description: String,
    pub current_value: Option<String>,
    pub suggested_fix: Option<String>,
    pub sql_fix: Option<String>,
    pub is_resolved: bool,
    pub auto_fixable: bool,
    pub occurrence_count: i64,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
}

/// Totals written when a run completes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunTotals {
    pub total_issues: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub health_score: f64,
    pub duration_ms: u64,
    pub arrows_checked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRun {
    pub id: i64,
    pub run_timestamp: Option<String>,
    pub total_issues: i64,
    pub critical_issues: i64,
    pub warning_issues: i64,
    pub info_issues: i64,
    pub health_score: f64,
    pub run_duration_ms: i64,
    pub triggered_by: String,
    pub total_arrows_checked: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub category: Option<String>,
    pub severity: Option<String>,
    pub auto_fixable_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixMethod {
    Manual,
    Automated,
    Sql,
}

impl FixMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixMethod::Manual => "manual",
            FixMethod::Automated => "automated",
            FixMethod::Sql => "sql",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixAttempt {
    pub method: FixMethod,
    pub description: Option<String>,
    pub sql_executed: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub applied_by: String,
}

/// How `persist_issues` handled a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistOutcome {
    pub inserted: usize,
    pub recurring: usize,
}

const ISSUE_COLUMNS: &str = "id, run_id, issue_hash, category, severity, arrow_id, manufacturer,
    model_name, field, issue_description, current_value, suggested_fix, sql_fix, is_resolved,
    auto_fixable, occurrence_count, first_seen, last_seen";

pub struct ValidationRepo;

impl ValidationRepo {
    pub fn start_run(conn: &Connection, triggered_by: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO validation_runs (triggered_by) VALUES (?1)",
            [triggered_by],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Store issues for a run
    ///
    /// An issue whose hash matches an unresolved issue is not duplicated;
    /// the existing row is moved to this run and its occurrence count bumped.
    pub fn persist_issues(
        conn: &Connection,
        run_id: i64,
        issues: &[NewIssue],
    ) -> Result<PersistOutcome> {
        let mut outcome = PersistOutcome::default();
        for issue in issues {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM validation_issues
                     WHERE issue_hash = ?1 AND is_resolved = 0
                     ORDER BY id LIMIT 1",
                    [&issue.issue_hash],
                    |row| row.get(0),
                )
                .optional()
                .map_err(from_rusqlite)?;

            match existing {
                Some(id) => {
                    conn.execute(
                        "UPDATE validation_issues
                         SET occurrence_count = occurrence_count + 1,
                             last_seen = CURRENT_TIMESTAMP,
                             run_id = ?1
                         WHERE id = ?2",
                        rusqlite::params![run_id, id],
                    )
                    .map_err(from_rusqlite)?;
                    outcome.recurring += 1;
                }
                None => {
                    conn.execute(
                        "INSERT INTO validation_issues
                         (run_id, issue_hash, category, severity, arrow_id, manufacturer,
                          model_name, field, issue_description, current_value, suggested_fix,
                          sql_fix, auto_fixable)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                        rusqlite::params![
                            run_id,
                            issue.issue_hash,
                            issue.category,
                            issue.severity,
                            issue.arrow_id,
                            issue.manufacturer,
                            issue.model_name,
                            issue.field,
                            issue.issue_description,
                            issue.current_value,
                            issue.suggested_fix,
                            issue.sql_fix,
                            issue.auto_fixable,
                        ],
                    )
                    .map_err(from_rusqlite)?;
                    outcome.inserted += 1;
                }
            }
        }
        tracing::debug!(
            run_id,
            inserted = outcome.inserted,
            recurring = outcome.recurring,
            "validation issues persisted"
        );
        Ok(outcome)
    }

    pub fn complete_run(conn: &Connection, run_id: i64, totals: &RunTotals) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE validation_runs
                 SET total_issues = ?1, critical_issues = ?2, warning_issues = ?3,
                     info_issues = ?4, health_score = ?5, run_duration_ms = ?6,
                     total_arrows_checked = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    totals.total_issues as i64,
                    totals.critical as i64,
                    totals.warning as i64,
                    totals.info as i64,
                    totals.health_score,
                    i64::try_from(totals.duration_ms).unwrap_or(i64::MAX),
                    totals.arrows_checked as i64,
                    run_id,
                ],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found("complete_validation_run", run_id.to_string()));
        }
        Ok(())
    }

    /// Most recent runs first
    pub fn history(conn: &Connection, limit: usize) -> Result<Vec<ValidationRun>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, run_timestamp, total_issues, critical_issues, warning_issues,
                        info_issues, health_score, run_duration_ms, triggered_by,
                        total_arrows_checked
                 FROM validation_runs ORDER BY id DESC LIMIT ?1",
            )
            .map_err(from_rusqlite)?;
        let runs = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                Ok(ValidationRun {
                    id: row.get(0)?,
                    run_timestamp: row.get(1)?,
                    total_issues: row.get(2)?,
                    critical_issues: row.get(3)?,
                    warning_issues: row.get(4)?,
                    info_issues: row.get(5)?,
                    health_score: row.get(6)?,
                    run_duration_ms: row.get(7)?,
                    triggered_by: row.get(8)?,
                    total_arrows_checked: row.get(9)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(runs)
    }

    /// Unresolved issues, critical first
    pub fn open_issues(conn: &Connection, filter: &IssueFilter) -> Result<Vec<StoredIssue>> {
        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM validation_issues WHERE is_resolved = 0");
        let mut params: Vec<SqlValue> = Vec::new();
        if let Some(category) = &filter.category {
            sql.push_str(" AND category = ?");
            params.push(SqlValue::Text(category.clone()));
        }
        if let Some(severity) = &filter.severity {
            sql.push_str(" AND severity = ?");
            params.push(SqlValue::Text(severity.clone()));
        }
        if filter.auto_fixable_only {
            sql.push_str(" AND auto_fixable = 1");
        }
        sql.push_str(
            " ORDER BY CASE severity WHEN 'critical' THEN 0 WHEN 'warning' THEN 1 ELSE 2 END, id",
        );
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let issues = stmt
            .query_map(rusqlite::params_from_iter(params), issue_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(issues)
    }

    pub fn get_issue(conn: &Connection, issue_id: i64) -> Result<Option<StoredIssue>> {
        conn.query_row(
            &format!("SELECT {ISSUE_COLUMNS} FROM validation_issues WHERE id = ?1"),
            [issue_id],
            issue_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn record_fix(conn: &Connection, issue_id: i64, attempt: &FixAttempt) -> Result<i64> {
        conn.execute(
            "INSERT INTO validation_fixes
             (issue_id, fix_method, fix_description, sql_executed, success, error_message,
              applied_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                issue_id,
                attempt.method.as_str(),
                attempt.description,
                attempt.sql_executed,
                attempt.success,
                attempt.error_message,
                attempt.applied_by,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn fix_count(conn: &Connection, issue_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM validation_fixes WHERE issue_id = ?1",
            [issue_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    /// # Errors
    ///
    /// `NotFound` when the issue does not exist.
    pub fn resolve_issue(conn: &Connection, issue_id: i64, resolved_by: &str) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE validation_issues
                 SET is_resolved = 1, resolved_at = CURRENT_TIMESTAMP, resolved_by = ?1
                 WHERE id = ?2",
                rusqlite::params![resolved_by, issue_id],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found("resolve_issue", issue_id.to_string()));
        }
        Ok(())
    }
    /// Record that two arrows are known not to be duplicates
    ///
    /// The pair is stored smallest id first; marking it again is a no-op.
    pub fn exclude_duplicate_pair(
        conn: &Connection,
        arrow_a: i64,
        arrow_b: i64,
        reason: Option<&str>,
        created_by: &str,
    ) -> Result<bool> {
        let (first, second) = if arrow_a <= arrow_b { (arrow_a, arrow_b) } else { (arrow_b, arrow_a) };
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO duplicate_exclusions (arrow_id_1, arrow_id_2, reason, created_by)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![first, second, reason, created_by],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Every excluded pair, smallest id first
    pub fn excluded_pairs(conn: &Connection) -> Result<HashSet<(i64, i64)>> {
        let mut stmt = conn
            .prepare("SELECT arrow_id_1, arrow_id_2 FROM duplicate_exclusions")
            .map_err(from_rusqlite)?;
        let pairs = stmt
            .query_map([], |row| {
                let (a, b): (i64, i64) = (row.get(0)?, row.get(1)?);
                Ok((a.min(b), a.max(b)))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(pairs)
    }
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<StoredIssue> {
    Ok(StoredIssue {
        id: row.get(0)?,
        run_id: row.get(1)?,
        issue_hash: row.get(2)?,
        category: row.get(3)?,
        severity: row.get(4)?,
        arrow_id: row.get(5)?,
        manufacturer: row.get(6)?,
        model_name: row.get(7)?,
        field: row.get(8)?,
        issue_description: row.get(9)?,
        current_value: row.get(10)?,
        suggested_fix: row.get(11)?,
        sql_fix: row.get(12)?,
        is_resolved: row.get(13)?,
        auto_fixable: row.get(14)?,
        occurrence_count: row.get(15)?,
        first_seen: row.get(16)?,
        last_seen: row.get(17)?,
    })
}
