//! Catalog data-quality validation
//!
//! [`DataValidator`] runs every check against the database and builds a
//! [`ValidationReport`]. Persisting runs and applying fixes is done by
//! `commands::validate`.

#![allow(clippy::result_large_err)]

mod checks;
mod report;

pub use checks::CATEGORIES;
pub use report::{
    health_score, sql_fix_script, CategoryCount, MaterialCount, SpineCoverage, ValidationReport,
};

use quiver_store::errors::{from_rusqlite, Result};
use quiver_store::repo::NewIssue;
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub category: &'static str,
    pub severity: Severity,
    /// `None` for database-level problems
    pub arrow_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub field: String,
    pub issue: String,
    pub current_value: Option<String>,
    pub suggested_fix: String,
    /// Statement that repairs the problem; a leading `--` marks it as advice only
    pub sql_fix: Option<String>,
}

impl ValidationIssue {
    /// Stable identity across runs: SHA-256 of `arrow_id:field:issue:current_value`
    pub fn issue_hash(&self) -> String {
        let content = format!(
            "{}:{}:{}:{}",
            self.arrow_id.unwrap_or(0),
            self.field,
            self.issue,
            self.current_value.as_deref().unwrap_or("")
        );
        hex::encode(Sha256::digest(content.as_bytes()))
    }

    pub fn auto_fixable(&self) -> bool {
        self.sql_fix
            .as_deref()
            .map(|sql| !sql.trim().is_empty() && !sql.trim_start().starts_with("--"))
            .unwrap_or(false)
    }

    pub fn to_new_issue(&self) -> NewIssue {
        NewIssue {
            issue_hash: self.issue_hash(),
            category: self.category.to_string(),
            severity: self.severity.as_str().to_string(),
            arrow_id: self.arrow_id,
            manufacturer: self.manufacturer.clone(),
            model_name: self.model_name.clone(),
            field: Some(self.field.clone()),
            issue_description: self.issue.clone(),
            current_value: self.current_value.clone(),
            suggested_fix: Some(self.suggested_fix.clone()),
            sql_fix: self.sql_fix.clone(),
            auto_fixable: self.auto_fixable(),
        }
    }
}

/// Runs the catalog checks over one connection
pub struct DataValidator<'a> {
    conn: &'a Connection,
}

impl<'a> DataValidator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run every check, in category order
    ///
    /// # Errors
    ///
    /// `Persistence` when a check query fails.
    pub fn run(&self) -> Result<ValidationReport> {
        let total_arrows: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM arrows", [], |row| row.get(0))
            .map_err(from_rusqlite)?;

        let mut issues = Vec::new();
        for (category, check) in checks::all() {
            let found = check(self.conn)?;
            tracing::debug!(category, issues = found.len(), "validation check");
            issues.extend(found);
        }

        ValidationReport::build(
            self.conn,
            usize::try_from(total_arrows).unwrap_or(0),
            issues,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(sql_fix: Option<&str>) -> ValidationIssue {
        ValidationIssue {
            category: checks::SPINE_DATA_QUALITY,
            severity: Severity::Critical,
            arrow_id: Some(12),
            manufacturer: Some("Easton Archery".to_string()),
            model_name: Some("Axis".to_string()),
            field: "spine".to_string(),
            issue: "Invalid or missing spine value".to_string(),
            current_value: Some("0".to_string()),
            suggested_fix: "Remove invalid spine specification".to_string(),
            sql_fix: sql_fix.map(str::to_string),
        }
    }

    #[test]
    fn test_issue_hash_is_stable_sha256() {
        let a = issue(None);
        let b = issue(Some("DELETE FROM spine_specifications WHERE id = 4;"));
        assert_eq!(a.issue_hash(), b.issue_hash());
        assert_eq!(a.issue_hash().len(), 64);

        let mut c = issue(None);
        c.current_value = Some("5".to_string());
        assert_ne!(a.issue_hash(), c.issue_hash());
    }

    #[test]
    fn test_auto_fixable_needs_executable_sql() {
        assert!(issue(Some("DELETE FROM spine_specifications WHERE id = 4;")).auto_fixable());
        assert!(!issue(Some("-- Manual review required")).auto_fixable());
        assert!(!issue(None).auto_fixable());
    }

    #[test]
    fn test_to_new_issue_carries_hash_and_flag() {
        let new_issue = issue(Some("DELETE FROM spine_specifications WHERE id = 4;")).to_new_issue();
        assert_eq!(new_issue.severity, "critical");
        assert_eq!(new_issue.category, "Spine Data Quality");
        assert!(new_issue.auto_fixable);
        assert_eq!(new_issue.field.as_deref(), Some("spine"));
    }
}
