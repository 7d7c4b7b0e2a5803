//! Individual validation checks, one function per category

#![allow(clippy::result_large_err)]

use super::{Severity, ValidationIssue};
use quiver_core::model::{suggest_material_mapping, Material};
use quiver_store::errors::{from_rusqlite, Result};
use quiver_store::repo::ValidationRepo;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

pub const CRITICAL_FIELDS: &str = "Critical Fields";
pub const DATABASE_INTEGRITY: &str = "Database Integrity";
pub const MATERIAL_STANDARDIZATION: &str = "Material Standardization";
pub const SPINE_DATA_QUALITY: &str = "Spine Data Quality";
pub const MANUFACTURER_INTEGRATION: &str = "Manufacturer Integration";
pub const DUPLICATE_DETECTION: &str = "Duplicate Detection";
pub const DATA_FIELD_FORMATTING: &str = "Data Field Formatting";
pub const CALCULATOR_COMPATIBILITY: &str = "Calculator Compatibility";

/// Report order of the categories
pub const CATEGORIES: [&str; 8] = [
    CRITICAL_FIELDS,
    DATABASE_INTEGRITY,
    MATERIAL_STANDARDIZATION,
    SPINE_DATA_QUALITY,
    MANUFACTURER_INTEGRATION,
    DUPLICATE_DETECTION,
    DATA_FIELD_FORMATTING,
    CALCULATOR_COMPATIBILITY,
];

const ORPHAN_LIMIT: usize = 10;
const NEAR_DUPLICATE_LIMIT: usize = 50;
const IDENTICAL_SPEC_LIMIT: usize = 25;

const MIN_LENGTH: f64 = 6.0;
const MAX_LENGTH: f64 = 36.0;
const OUTER_DIAMETER_RANGE: (f64, f64) = (0.1, 1.0);
const GPI_RANGE: (f64, f64) = (1.0, 50.0);

type Check = fn(&Connection) -> Result<Vec<ValidationIssue>>;

pub(crate) fn all() -> [(&'static str, Check); 8] {
    [
        (CRITICAL_FIELDS, critical_fields),
        (DATABASE_INTEGRITY, database_integrity),
        (MATERIAL_STANDARDIZATION, material_standardization),
        (SPINE_DATA_QUALITY, spine_data_quality),
        (MANUFACTURER_INTEGRATION, manufacturer_integration),
        (DUPLICATE_DETECTION, duplicate_detection),
        (DATA_FIELD_FORMATTING, data_field_formatting),
        (CALCULATOR_COMPATIBILITY, calculator_compatibility),
    ]
}

/// The arrow an issue is about
#[derive(Debug, Clone)]
struct ArrowRef {
    id: i64,
    manufacturer: Option<String>,
    model_name: Option<String>,
}

impl ArrowRef {
    /// Columns 0..=2 must be arrow id, manufacturer, model name
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            manufacturer: row.get(1)?,
            model_name: row.get(2)?,
        })
    }

    fn issue(
        &self,
        category: &'static str,
        severity: Severity,
        field: &str,
        issue: impl Into<String>,
    ) -> ValidationIssue {
        ValidationIssue {
            category,
            severity,
            arrow_id: Some(self.id),
            manufacturer: self.manufacturer.clone(),
            model_name: self.model_name.clone(),
            field: field.to_string(),
            issue: issue.into(),
            current_value: None,
            suggested_fix: String::new(),
            sql_fix: None,
        }
    }
}

impl ValidationIssue {
    fn value(mut self, value: Option<String>) -> Self {
        self.current_value = value;
        self
    }

    fn suggest(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = fix.into();
        self
    }

    fn fix(mut self, sql: impl Into<String>) -> Self {
        self.sql_fix = Some(sql.into());
        self
    }
}

fn query<T, F>(conn: &Connection, sql: &str, f: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], f)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
    .map_err(from_rusqlite)
}

/// SQL string literal
fn sql_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Loosely typed column value as text
fn value_text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Null => None,
        SqlValue::Integer(i) => Some(i.to_string()),
        SqlValue::Real(f) => Some(f.to_string()),
        SqlValue::Text(t) => Some(t.clone()),
        SqlValue::Blob(_) => Some("<blob>".to_string()),
    }
}

fn value_number(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Integer(i) => Some(*i as f64),
        SqlValue::Real(f) => Some(*f),
        SqlValue::Text(t) => t.trim().parse().ok(),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

fn fmt_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

fn critical_fields(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let rows = query(
        conn,
        "SELECT id, manufacturer, model_name FROM arrows
         WHERE manufacturer IS NULL OR TRIM(manufacturer) = '' ORDER BY id",
        ArrowRef::from_row,
    )?;
    for arrow in rows {
        issues.push(
            arrow
                .issue(CRITICAL_FIELDS, Severity::Critical, "manufacturer", "Missing or empty manufacturer")
                .value(arrow.manufacturer.clone())
                .suggest("Add manufacturer name or mark as 'Unknown'")
                .fix(format!("UPDATE arrows SET manufacturer = 'Unknown' WHERE id = {};", arrow.id)),
        );
    }

    let rows = query(
        conn,
        "SELECT id, manufacturer, model_name FROM arrows
         WHERE model_name IS NULL OR TRIM(model_name) = '' ORDER BY id",
        ArrowRef::from_row,
    )?;
    for arrow in rows {
        issues.push(
            arrow
                .issue(CRITICAL_FIELDS, Severity::Critical, "model_name", "Missing or empty model name")
                .value(arrow.model_name.clone())
                .suggest("Add model name or mark as 'Unnamed Model'")
                .fix(format!("UPDATE arrows SET model_name = 'Unnamed Model' WHERE id = {};", arrow.id)),
        );
    }

    let rows = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name FROM arrows a
         LEFT JOIN spine_specifications s ON a.id = s.arrow_id
         WHERE s.id IS NULL ORDER BY a.id",
        ArrowRef::from_row,
    )?;
    for arrow in rows {
        issues.push(
            arrow
                .issue(
                    CRITICAL_FIELDS,
                    Severity::Critical,
                    "spine_specifications",
                    "No spine specifications available",
                )
                .value(Some("NULL".to_string()))
                .suggest("Add spine specifications or remove arrow")
                .fix(format!(
                    "DELETE FROM arrows WHERE id = {}; -- Remove arrow without spine data",
                    arrow.id
                )),
        );
    }

    Ok(issues)
}

fn database_integrity(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if !table_exists(conn, "manufacturers")? {
        issues.push(ValidationIssue {
            category: DATABASE_INTEGRITY,
            severity: Severity::Critical,
            arrow_id: None,
            manufacturer: Some("SYSTEM".to_string()),
            model_name: Some("DATABASE".to_string()),
            field: "manufacturers_table".to_string(),
            issue: "manufacturers table does not exist".to_string(),
            current_value: Some("Table missing".to_string()),
            suggested_fix: "Create the manufacturers table".to_string(),
            sql_fix: Some(
                "CREATE TABLE manufacturers (id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 name TEXT NOT NULL UNIQUE, website_url TEXT, country TEXT, \
                 is_active BOOLEAN NOT NULL DEFAULT 1, created_at TEXT DEFAULT CURRENT_TIMESTAMP, \
                 updated_at TEXT DEFAULT CURRENT_TIMESTAMP);"
                    .to_string(),
            ),
        });
    }

    let orphans = query(
        conn,
        "SELECT s.id, s.arrow_id FROM spine_specifications s
         LEFT JOIN arrows a ON s.arrow_id = a.id
         WHERE a.id IS NULL ORDER BY s.id",
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    for (spec_id, arrow_id) in orphans.into_iter().take(ORPHAN_LIMIT) {
        issues.push(ValidationIssue {
            category: DATABASE_INTEGRITY,
            severity: Severity::Warning,
            arrow_id: Some(arrow_id),
            manufacturer: None,
            model_name: None,
            field: "arrow_id_reference".to_string(),
            issue: "Spine specification references non-existent arrow".to_string(),
            current_value: Some(format!("Orphaned spec ID {spec_id}")),
            suggested_fix: "Remove orphaned spine specification".to_string(),
            sql_fix: Some(format!("DELETE FROM spine_specifications WHERE id = {spec_id};")),
        });
    }

    Ok(issues)
}

fn material_standardization(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let rows = query(
        conn,
        "SELECT id, manufacturer, model_name, material FROM arrows ORDER BY id",
        |row| Ok((ArrowRef::from_row(row)?, row.get::<_, Option<String>>(3)?)),
    )?;

    for (arrow, material) in rows {
        match material.as_deref().map(str::trim) {
            None | Some("") => issues.push(
                arrow
                    .issue(
                        MATERIAL_STANDARDIZATION,
                        Severity::Warning,
                        "material",
                        "Missing material specification",
                    )
                    .value(material.clone())
                    .suggest("Set to 'Carbon' (most common default)")
                    .fix(format!("UPDATE arrows SET material = 'Carbon' WHERE id = {};", arrow.id)),
            ),
            Some(_) => {
                let raw = material.as_deref().unwrap_or_default();
                if Material::is_standard(raw) {
                    continue;
                }
                let suggested = suggest_material_mapping(raw);
                if suggested.as_str() == raw {
                    continue;
                }
                issues.push(
                    arrow
                        .issue(
                            MATERIAL_STANDARDIZATION,
                            Severity::Warning,
                            "material",
                            format!("Non-standard material: '{raw}'"),
                        )
                        .value(Some(raw.to_string()))
                        .suggest(format!("Map to standard material: '{suggested}'"))
                        .fix(format!(
                            "UPDATE arrows SET material = {} WHERE material = {};",
                            sql_text(suggested.as_str()),
                            sql_text(raw)
                        )),
                );
            }
        }
    }
    Ok(issues)
}

/// Realistic spine bounds for a stored material
fn spine_bounds(material: &str) -> Option<(f64, f64, &'static str)> {
    match material {
        "Wood" => Some((25.0, 100.0, "25-100 lbs")),
        "Carbon" => Some((150.0, 2000.0, "150-2000")),
        "Aluminum" => Some((150.0, 3000.0, "150-3000")),
        _ => None,
    }
}

fn spine_data_quality(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let rows = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name, s.id, s.spine, a.material
         FROM spine_specifications s JOIN arrows a ON s.arrow_id = a.id
         ORDER BY a.id, s.id",
        |row| {
            Ok((
                ArrowRef::from_row(row)?,
                row.get::<_, i64>(3)?,
                row.get::<_, SqlValue>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        },
    )?;

    for (arrow, spec_id, spine, material) in rows {
        let value = value_number(&spine);
        let Some(value) = value.filter(|v| *v != 0.0) else {
            issues.push(
                arrow
                    .issue(SPINE_DATA_QUALITY, Severity::Critical, "spine", "Invalid or missing spine value")
                    .value(value_text(&spine))
                    .suggest("Remove invalid spine specification")
                    .fix(format!("DELETE FROM spine_specifications WHERE id = {spec_id};")),
            );
            continue;
        };

        let material = material.unwrap_or_default();
        if let Some((lo, hi, label)) = spine_bounds(&material) {
            if value < lo || value > hi {
                issues.push(
                    arrow
                        .issue(
                            SPINE_DATA_QUALITY,
                            Severity::Warning,
                            "spine",
                            format!(
                                "Spine value {value} outside realistic range for {material} arrows ({label})"
                            ),
                        )
                        .value(value_text(&spine))
                        .suggest(format!("Verify spine value is correct for {material} material"))
                        .fix(format!(
                            "-- Manual review required for spine_specifications.id = {spec_id}"
                        )),
                );
            }
        }
    }
    Ok(issues)
}

fn manufacturer_integration(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    // Reported under Database Integrity instead
    if !table_exists(conn, "manufacturers")? {
        return Ok(Vec::new());
    }
    let mut issues = Vec::new();

    let missing = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name FROM arrows a
         LEFT JOIN manufacturers m ON a.manufacturer = m.name
         WHERE m.name IS NULL AND TRIM(a.manufacturer) != ''
         ORDER BY a.id",
        ArrowRef::from_row,
    )?;
    for arrow in missing {
        let name = arrow.manufacturer.clone().unwrap_or_default();
        issues.push(
            arrow
                .issue(
                    MANUFACTURER_INTEGRATION,
                    Severity::Critical,
                    "manufacturer",
                    "References non-existent manufacturer",
                )
                .value(Some(name.clone()))
                .suggest("Create manufacturer entry or update manufacturer name")
                .fix(format!(
                    "INSERT OR IGNORE INTO manufacturers (name, is_active) VALUES ({}, 1);",
                    sql_text(&name)
                )),
        );
    }

    let inactive = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name FROM arrows a
         JOIN manufacturers m ON a.manufacturer = m.name
         WHERE m.is_active = 0 ORDER BY a.id",
        ArrowRef::from_row,
    )?;
    for arrow in inactive {
        let name = arrow.manufacturer.clone().unwrap_or_default();
        issues.push(
            arrow
                .issue(
                    MANUFACTURER_INTEGRATION,
                    Severity::Info,
                    "manufacturer_active_status",
                    "Arrow from inactive manufacturer (hidden from calculator)",
                )
                .value(Some("inactive".to_string()))
                .suggest("Reactivate manufacturer or migrate arrows")
                .fix(format!(
                    "UPDATE manufacturers SET is_active = 1 WHERE name = {};",
                    sql_text(&name)
                )),
        );
    }

    Ok(issues)
}

fn normalized(text: &str) -> String {
    text.trim().to_lowercase()
}

fn duplicate_detection(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let excluded = ValidationRepo::excluded_pairs(conn)?;
    let is_excluded = |a: i64, b: i64| excluded.contains(&(a.min(b), a.max(b)));
    let mut issues = Vec::new();

    // Same manufacturer and model once case and outer whitespace are ignored
    let arrows = query(
        conn,
        "SELECT id, manufacturer, model_name FROM arrows ORDER BY id",
        ArrowRef::from_row,
    )?;
    let mut groups: BTreeMap<(String, String), Vec<&ArrowRef>> = BTreeMap::new();
    for arrow in &arrows {
        if let (Some(manufacturer), Some(model)) = (&arrow.manufacturer, &arrow.model_name) {
            groups
                .entry((normalized(manufacturer), normalized(model)))
                .or_default()
                .push(arrow);
        }
    }
    for group in groups.values().filter(|g| g.len() > 1) {
        let keeper = group[0].id;
        for duplicate in &group[1..] {
            if is_excluded(keeper, duplicate.id) {
                continue;
            }
            issues.push(
                duplicate
                    .issue(
                        DUPLICATE_DETECTION,
                        Severity::Warning,
                        "duplicate_arrow",
                        format!("Duplicate arrow entry ({} total found)", group.len()),
                    )
                    .value(Some(format!("Arrow ID {}", duplicate.id)))
                    .suggest("Remove duplicate or merge specifications")
                    .fix(format!(
                        "-- DELETE FROM arrows WHERE id = {}; -- Review before deletion",
                        duplicate.id
                    )),
            );
        }
    }

    // Repeated spine rows on one arrow
    let specs = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name, s.id, s.spine
         FROM spine_specifications s JOIN arrows a ON s.arrow_id = a.id
         ORDER BY a.id, s.id",
        |row| {
            Ok((
                ArrowRef::from_row(row)?,
                row.get::<_, i64>(3)?,
                row.get::<_, SqlValue>(4)?,
            ))
        },
    )?;
    let mut spine_groups: BTreeMap<(i64, Option<String>), Vec<(&ArrowRef, i64)>> = BTreeMap::new();
    for (arrow, spec_id, spine) in &specs {
        spine_groups
            .entry((arrow.id, value_text(spine)))
            .or_default()
            .push((arrow, *spec_id));
    }
    for ((_, spine), group) in spine_groups.iter().filter(|(_, g)| g.len() > 1) {
        let spine = spine.as_deref().unwrap_or("None");
        for (arrow, spec_id) in &group[1..] {
            issues.push(
                arrow
                    .issue(
                        DUPLICATE_DETECTION,
                        Severity::Warning,
                        "duplicate_spine_spec",
                        format!("Duplicate spine specification (spine {spine}, {} total)", group.len()),
                    )
                    .value(Some(format!("Spine spec ID {spec_id}")))
                    .suggest("Remove duplicate spine specification")
                    .fix(format!("DELETE FROM spine_specifications WHERE id = {spec_id};")),
            );
        }
    }

    // Model names that differ only in spacing or hyphens, or contain one another
    let near = query(
        conn,
        "SELECT a2.id, a2.manufacturer, a2.model_name, a1.id, a1.model_name
         FROM arrows a1 JOIN arrows a2 ON a1.id < a2.id
         WHERE LOWER(TRIM(a1.manufacturer)) = LOWER(TRIM(a2.manufacturer))
           AND LOWER(TRIM(a1.model_name)) != LOWER(TRIM(a2.model_name))
           AND (
             LOWER(REPLACE(REPLACE(a1.model_name, ' ', ''), '-', '')) =
             LOWER(REPLACE(REPLACE(a2.model_name, ' ', ''), '-', ''))
             OR (LENGTH(a1.model_name) > 3 AND LENGTH(a2.model_name) > 3 AND
                 (INSTR(LOWER(a1.model_name), LOWER(a2.model_name)) > 0 OR
                  INSTR(LOWER(a2.model_name), LOWER(a1.model_name)) > 0))
           )
         ORDER BY a1.id, a2.id",
        |row| {
            Ok((
                ArrowRef::from_row(row)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    )?;
    for (arrow, other_id, other_model) in near
        .into_iter()
        .filter(|(arrow, other_id, _)| !is_excluded(arrow.id, *other_id))
        .take(NEAR_DUPLICATE_LIMIT)
    {
        issues.push(
            arrow
                .issue(
                    DUPLICATE_DETECTION,
                    Severity::Info,
                    "near_duplicate",
                    format!("Potential duplicate of Arrow ID {other_id} ({other_model})"),
                )
                .value(Some(format!("Similar to: {other_model}")))
                .suggest("Review and merge if truly duplicate")
                .fix(format!("-- Potential duplicate: Compare Arrow {other_id} vs {}", arrow.id)),
        );
    }

    // Different models from one manufacturer sharing a spine row
    let identical = query(
        conn,
        "SELECT a2.id, a2.manufacturer, a2.model_name, a1.id, a1.model_name,
                s1.spine, s1.outer_diameter, s1.gpi_weight
         FROM spine_specifications s1
         JOIN spine_specifications s2 ON s1.id < s2.id
         JOIN arrows a1 ON s1.arrow_id = a1.id
         JOIN arrows a2 ON s2.arrow_id = a2.id
         WHERE LOWER(TRIM(a1.manufacturer)) = LOWER(TRIM(a2.manufacturer))
           AND s1.spine = s2.spine
           AND ABS(COALESCE(s1.outer_diameter, 0) - COALESCE(s2.outer_diameter, 0)) < 0.001
           AND ABS(COALESCE(s1.gpi_weight, 0) - COALESCE(s2.gpi_weight, 0)) < 0.1
           AND s1.arrow_id != s2.arrow_id
         ORDER BY s1.id, s2.id",
        |row| {
            Ok((
                ArrowRef::from_row(row)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, SqlValue>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<f64>>(7)?,
            ))
        },
    )?;
    for (arrow, other_id, other_model, spine, diameter, gpi) in identical
        .into_iter()
        .filter(|row| !is_excluded(row.0.id, row.1))
        .take(IDENTICAL_SPEC_LIMIT)
    {
        let other_model = other_model.unwrap_or_default();
        issues.push(
            arrow
                .issue(
                    DUPLICATE_DETECTION,
                    Severity::Info,
                    "identical_specifications",
                    format!(
                        "Identical specs to {other_model} (spine {}, diameter {}, weight {})",
                        value_text(&spine).unwrap_or_else(|| "None".to_string()),
                        fmt_number(diameter),
                        fmt_number(gpi)
                    ),
                )
                .value(Some("Identical specifications".to_string()))
                .suggest("Review if truly different arrows or consolidate")
                .fix(format!(
                    "-- Review: Arrow {other_id} vs {} have identical specs",
                    arrow.id
                )),
        );
    }

    Ok(issues)
}

/// What is wrong with one stored `length_options` value
#[derive(Debug, Clone, PartialEq)]
enum LengthProblem {
    /// "33,5" written for 33.5
    DecimalComma(String),
    Other(String),
}

impl LengthProblem {
    fn message(&self) -> &str {
        match self {
            LengthProblem::DecimalComma(m) | LengthProblem::Other(m) => m,
        }
    }
}

fn strip_quotes(text: &str) -> String {
    text.trim().replace(['"', '\'', '\\'], "")
}

fn is_decimal_comma(text: &str) -> bool {
    let clean = strip_quotes(text);
    match clean.split_once(',') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.chars().all(|c| c.is_ascii_digit())
                && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn plausible_length(value: f64) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&value)
}

fn length_problems(raw: &str) -> Vec<LengthProblem> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return vec![LengthProblem::Other(format!(
                "Invalid JSON in length_options: {e}"
            ))]
        }
    };
    let Some(items) = parsed.as_array() else {
        return vec![LengthProblem::Other(
            "length_options is not a JSON array".to_string(),
        )];
    };

    let mut problems = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Number(n) => {
                if !n.as_f64().is_some_and(plausible_length) {
                    problems.push(LengthProblem::Other(format!("Unrealistic length value: {n}")));
                }
            }
            Value::String(s) if is_decimal_comma(s) => {
                problems.push(LengthProblem::DecimalComma(format!(
                    "European decimal comma notation at index {index}: '{s}' (should use period: '{}')",
                    s.replace(',', ".")
                )));
            }
            Value::String(s) if s.contains(',') => {
                problems.push(LengthProblem::Other(format!(
                    "Malformed length value at index {index}: '{s}' (contains problematic comma)"
                )));
            }
            Value::String(s) => {
                let ok = strip_quotes(s).parse::<f64>().is_ok_and(plausible_length);
                if !ok {
                    problems.push(LengthProblem::Other(format!(
                        "Invalid length format at index {index}: '{s}'"
                    )));
                }
            }
            other => problems.push(LengthProblem::Other(format!(
                "Invalid length format at index {index}: {other}"
            ))),
        }
    }
    problems
}

/// Rewrite decimal-comma strings as numbers; `None` when `raw` is not a list
fn fix_decimal_commas(raw: &str) -> Option<String> {
    let items: Vec<Value> = serde_json::from_str(raw).ok()?;
    let fixed: Vec<Value> = items
        .into_iter()
        .map(|item| match &item {
            Value::String(s) if is_decimal_comma(s) => strip_quotes(s)
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(item),
            _ => item,
        })
        .collect();
    serde_json::to_string(&fixed).ok()
}

fn length_options_fix(spec_id: i64, raw: &str, problem: &LengthProblem) -> String {
    if let LengthProblem::DecimalComma(_) = problem {
        if let Some(fixed) = fix_decimal_commas(raw) {
            return format!(
                "UPDATE spine_specifications SET length_options = {} WHERE id = {spec_id};",
                sql_text(&fixed)
            );
        }
    }
    let note: String = problem
        .message()
        .chars()
        .filter(|c| *c != '\n')
        .take(50)
        .collect();
    format!("UPDATE spine_specifications SET length_options = NULL WHERE id = {spec_id}; -- Fix manually: {note}")
}

fn data_field_formatting(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let rows = query(
        conn,
        "SELECT a.id, a.manufacturer, a.model_name, s.id, s.length_options,
                s.outer_diameter, s.gpi_weight
         FROM spine_specifications s JOIN arrows a ON s.arrow_id = a.id
         ORDER BY a.id, s.id",
        |row| {
            Ok((
                ArrowRef::from_row(row)?,
                row.get::<_, i64>(3)?,
                row.get::<_, SqlValue>(4)?,
                row.get::<_, SqlValue>(5)?,
                row.get::<_, SqlValue>(6)?,
            ))
        },
    )?;

    for (arrow, spec_id, lengths, diameter, gpi) in rows {
        if let Some(raw) = value_text(&lengths).filter(|s| !s.trim().is_empty()) {
            for problem in length_problems(&raw) {
                issues.push(
                    arrow
                        .issue(
                            DATA_FIELD_FORMATTING,
                            Severity::Critical,
                            "length_options",
                            problem.message(),
                        )
                        .value(Some(raw.clone()))
                        .suggest("Fix formatting to a JSON array of lengths in inches")
                        .fix(length_options_fix(spec_id, &raw, &problem)),
                );
            }
        }

        if diameter != SqlValue::Null {
            let (lo, hi) = OUTER_DIAMETER_RANGE;
            if !value_number(&diameter).is_some_and(|d| (lo..=hi).contains(&d)) {
                let shown = value_text(&diameter).unwrap_or_default();
                issues.push(
                    arrow
                        .issue(
                            DATA_FIELD_FORMATTING,
                            Severity::Warning,
                            "outer_diameter",
                            format!("Invalid outer diameter value: '{shown}'"),
                        )
                        .value(Some(shown))
                        .suggest(format!("Should be a number of inches between {lo} and {hi}"))
                        .fix(format!(
                            "-- UPDATE spine_specifications SET outer_diameter = corrected_value WHERE id = {spec_id};"
                        )),
                );
            }
        }

        if gpi != SqlValue::Null {
            let (lo, hi) = GPI_RANGE;
            if !value_number(&gpi).is_some_and(|g| (lo..=hi).contains(&g)) {
                let shown = value_text(&gpi).unwrap_or_default();
                issues.push(
                    arrow
                        .issue(
                            DATA_FIELD_FORMATTING,
                            Severity::Warning,
                            "gpi_weight",
                            format!("Invalid gpi weight value: '{shown}'"),
                        )
                        .value(Some(shown))
                        .suggest(format!("Should be a number between {lo:.1} and {hi:.1} gpi"))
                        .fix(format!(
                            "-- UPDATE spine_specifications SET gpi_weight = corrected_value WHERE id = {spec_id};"
                        )),
                );
            }
        }
    }
    Ok(issues)
}

fn calculator_compatibility(conn: &Connection) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let rows = query(
        conn,
        "SELECT id, manufacturer, model_name, material FROM arrows
         WHERE material IS NOT NULL AND TRIM(material) != '' ORDER BY id",
        |row| Ok((ArrowRef::from_row(row)?, row.get::<_, String>(3)?)),
    )?;

    let standard: HashSet<String> = Material::STANDARD
        .iter()
        .map(|m| m.as_str().to_lowercase())
        .collect();
    for (arrow, material) in rows {
        if standard.contains(&material.to_lowercase()) {
            continue;
        }
        let suggested = suggest_material_mapping(&material);
        issues.push(
            arrow
                .issue(
                    CALCULATOR_COMPATIBILITY,
                    Severity::Warning,
                    "material",
                    format!("Material '{material}' not in standard calculator categories"),
                )
                .value(Some(material.clone()))
                .suggest(format!("Map to standard material: '{suggested}'"))
                .fix(format!(
                    "UPDATE arrows SET material = {} WHERE material = {};",
                    sql_text(suggested.as_str()),
                    sql_text(&material)
                )),
        );
    }
    Ok(issues)
}
