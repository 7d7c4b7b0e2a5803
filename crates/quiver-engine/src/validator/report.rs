#![allow(clippy::result_large_err)]

use super::checks::{
    CATEGORIES, CRITICAL_FIELDS, MANUFACTURER_INTEGRATION, MATERIAL_STANDARDIZATION,
};
use super::{Severity, ValidationIssue};
use quiver_store::errors::{from_rusqlite, Result};
use quiver_store::repo::RunTotals;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;

const CRITICAL_WEIGHT: f64 = 10.0;
const WARNING_WEIGHT: f64 = 3.0;
const INFO_WEIGHT: f64 = 1.0;
/// Worst case per arrow: one issue of each severity
const MAX_WEIGHT_PER_ARROW: f64 = CRITICAL_WEIGHT + WARNING_WEIGHT + INFO_WEIGHT;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialCount {
    pub material: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpineCoverage {
    pub arrows_with_specs: i64,
    pub total_arrows: i64,
    pub coverage_percentage: f64,
}

/// Outcome of one validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Set once the run has been persisted
    pub run_id: Option<i64>,
    pub total_arrows: usize,
    pub total_issues: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    /// Non-empty categories, in report order
    pub issues_by_category: Vec<CategoryCount>,
    pub issues: Vec<ValidationIssue>,
    pub health_score: f64,
    pub material_distribution: Vec<MaterialCount>,
    pub spine_coverage: SpineCoverage,
}

impl ValidationReport {
    pub(crate) fn build(
        conn: &Connection,
        total_arrows: usize,
        issues: Vec<ValidationIssue>,
    ) -> Result<Self> {
        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();
        let (critical, warning, info) = (
            count(Severity::Critical),
            count(Severity::Warning),
            count(Severity::Info),
        );

        let issues_by_category = CATEGORIES
            .iter()
            .map(|category| CategoryCount {
                category: *category,
                count: issues.iter().filter(|i| i.category == *category).count(),
            })
            .filter(|c| c.count > 0)
            .collect();

        Ok(Self {
            run_id: None,
            total_arrows,
            total_issues: issues.len(),
            critical,
            warning,
            info,
            issues_by_category,
            health_score: health_score(total_arrows, critical, warning, info),
            material_distribution: material_distribution(conn)?,
            spine_coverage: spine_coverage(conn)?,
            issues,
        })
    }

    pub fn auto_fixable(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.auto_fixable())
    }

    pub fn count_in(&self, category: &str) -> usize {
        self.issues_by_category
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Plain-language next steps, most urgent first
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.critical > 0 {
            out.push(format!(
                "Fix {} critical issues first; they prevent arrows from appearing in the calculator",
                self.critical
            ));
        }
        let critical_fields = self.count_in(CRITICAL_FIELDS);
        if critical_fields > 0 {
            out.push(format!(
                "Complete missing manufacturer, model or spine data on {critical_fields} arrows"
            ));
        }
        let materials = self.count_in(MATERIAL_STANDARDIZATION);
        if materials > 0 {
            out.push(format!(
                "Standardize {materials} material values to improve calculator matching"
            ));
        }
        let manufacturers = self.count_in(MANUFACTURER_INTEGRATION);
        if manufacturers > 0 {
            out.push(format!(
                "Resolve {manufacturers} manufacturer references so arrows stay visible"
            ));
        }
        let fixable = self.auto_fixable().count();
        if fixable > 0 {
            out.push(format!("{fixable} issues can be fixed automatically"));
        }
        if out.is_empty() {
            out.push("No action needed".to_string());
        }
        out
    }

    pub fn totals(&self, duration_ms: u64) -> RunTotals {
        RunTotals {
            total_issues: self.total_issues,
            critical: self.critical,
            warning: self.warning,
            info: self.info,
            health_score: self.health_score,
            duration_ms,
            arrows_checked: self.total_arrows,
        }
    }
}

/// 100 when clean, falling toward 0 as weighted issues approach one of each
/// severity per arrow. An empty catalog scores 0.
pub fn health_score(total_arrows: usize, critical: usize, warning: usize, info: usize) -> f64 {
    if total_arrows == 0 {
        return 0.0;
    }
    let penalty = critical as f64 * CRITICAL_WEIGHT
        + warning as f64 * WARNING_WEIGHT
        + info as f64 * INFO_WEIGHT;
    let max_penalty = total_arrows as f64 * MAX_WEIGHT_PER_ARROW;
    (100.0 - penalty / max_penalty * 100.0).max(0.0)
}

/// SQL script with every auto-fixable statement, grouped by category
///
/// Repeated statements are written once.
pub fn sql_fix_script(report: &ValidationReport) -> String {
    let fixable: Vec<&ValidationIssue> = report.auto_fixable().collect();
    let mut lines = vec![
        "-- Arrow catalog data fixes".to_string(),
        format!("-- {} auto-fixable issues", fixable.len()),
        String::new(),
        "BEGIN TRANSACTION;".to_string(),
    ];

    let mut written = HashSet::new();
    for category in CATEGORIES {
        let statements: Vec<&str> = fixable
            .iter()
            .filter(|i| i.category == category)
            .filter_map(|i| i.sql_fix.as_deref())
            .filter(|sql| written.insert(sql.to_string()))
            .collect();
        if statements.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("-- {category} ({} fixes)", statements.len()));
        lines.extend(statements.into_iter().map(str::to_string));
    }

    lines.push(String::new());
    lines.push("COMMIT;".to_string());
    lines.join("\n") + "\n"
}

fn material_distribution(conn: &Connection) -> Result<Vec<MaterialCount>> {
    let mut stmt = conn
        .prepare(
            "SELECT material, COUNT(*) FROM arrows
             GROUP BY material ORDER BY COUNT(*) DESC, material",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MaterialCount {
                material: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn spine_coverage(conn: &Connection) -> Result<SpineCoverage> {
    let (arrows_with_specs, total_arrows) = conn
        .query_row(
            "SELECT
               (SELECT COUNT(DISTINCT s.arrow_id) FROM spine_specifications s
                JOIN arrows a ON a.id = s.arrow_id),
               (SELECT COUNT(*) FROM arrows)",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .map_err(from_rusqlite)?;
    let coverage_percentage = if total_arrows > 0 {
        arrows_with_specs as f64 / total_arrows as f64 * 100.0
    } else {
        0.0
    };
    Ok(SpineCoverage {
        arrows_with_specs,
        total_arrows,
        coverage_percentage,
    })
}
