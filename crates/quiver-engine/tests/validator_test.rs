// Integration tests for the catalog data validator

use quiver_engine::commands::validate::mark_not_duplicate;
use quiver_engine::validator::{sql_fix_script, DataValidator, Severity, ValidationIssue};
use quiver_store::ArrowDocument;
use rusqlite::Connection;
use serde_json::json;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    quiver_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

/// Five arrows, four of them with known problems
fn seed_problem_catalog(conn: &Connection) {
    conn.execute_batch(
        r#"
        INSERT INTO manufacturers (name, is_active) VALUES ('Easton Archery', 1), ('Legacy Shafts', 0);

        INSERT INTO arrows (id, manufacturer, model_name, material) VALUES
            (1, 'Easton Archery', 'Axis', 'Carbon'),
            (2, '', 'Ghost', 'Carbon'),
            (3, 'Easton Archery', 'Zero', 'Carbon'),
            (4, 'Legacy Shafts', 'Old Faithful', 'carbon fiber'),
            (5, 'Mystery Arrows', 'Tube', 'Aluminum');

        INSERT INTO spine_specifications (id, arrow_id, spine, outer_diameter, gpi_weight, length_options) VALUES
            (11, 1, 340, 0.204, 9.5, '[28, 29, 30]'),
            (13, 3, 0, 0.204, 9.5, '[28, "33,5"]'),
            (14, 4, 400, 0.300, 8.0, NULL),
            (15, 5, 5000, 0.300, 10.0, NULL);
        "#,
    )
    .unwrap();
}

fn find<'a>(issues: &'a [ValidationIssue], arrow_id: i64, field: &str) -> &'a ValidationIssue {
    issues
        .iter()
        .find(|i| i.arrow_id == Some(arrow_id) && i.field == field)
        .unwrap_or_else(|| panic!("no {field} issue for arrow {arrow_id}"))
}

#[test]
fn test_clean_catalog_has_full_health() {
    // Given: A catalog imported from a well-formed document
    let mut conn = setup_test_db();
    let doc: ArrowDocument = serde_json::from_value(json!({
        "manufacturer": "Gold Tip",
        "arrows": [
            {"model_name": "Hunter", "material": "Carbon",
             "spine_specifications": [
                {"spine": 300, "outer_diameter": 0.298, "gpi_weight": 9.8},
                {"spine": 340, "outer_diameter": 0.298, "gpi_weight": 9.0}
             ]},
            {"model_name": "Pierce", "material": "Carbon",
             "spine_specifications": [
                {"spine": 250, "outer_diameter": 0.204, "gpi_weight": 10.8}
             ]}
        ]
    }))
    .unwrap();
    quiver_store::import_document(&mut conn, &doc).unwrap();

    // When: Validating
    let report = DataValidator::new(&conn).run().unwrap();

    // Then: Nothing is reported and health is perfect
    assert_eq!(report.total_arrows, 2);
    assert_eq!(report.total_issues, 0, "{:?}", report.issues);
    assert_eq!(report.health_score, 100.0);
    assert_eq!(report.spine_coverage.coverage_percentage, 100.0);
    assert_eq!(report.recommendations(), vec!["No action needed"]);
}

#[test]
fn test_empty_catalog_scores_zero() {
    let conn = setup_test_db();

    let report = DataValidator::new(&conn).run().unwrap();

    assert_eq!(report.total_arrows, 0);
    assert_eq!(report.total_issues, 0);
    assert_eq!(report.health_score, 0.0);
}

#[test]
fn test_problem_catalog_counts_and_health() {
    // Given: A catalog with known problems
    let conn = setup_test_db();
    seed_problem_catalog(&conn);

    // When: Validating
    let report = DataValidator::new(&conn).run().unwrap();

    // Then: Every problem is counted under the right severity
    assert_eq!(report.total_arrows, 5);
    assert_eq!((report.critical, report.warning, report.info), (5, 3, 1), "{:#?}", report.issues);
    assert_eq!(report.total_issues, 9);

    // 100 - (5*10 + 3*3 + 1) / (5*14) * 100
    let expected = 100.0 - 60.0 / 70.0 * 100.0;
    assert!((report.health_score - expected).abs() < 1e-9);

    let categories: Vec<(&str, usize)> = report
        .issues_by_category
        .iter()
        .map(|c| (c.category, c.count))
        .collect();
    assert_eq!(
        categories,
        vec![
            ("Critical Fields", 2),
            ("Material Standardization", 1),
            ("Spine Data Quality", 2),
            ("Manufacturer Integration", 2),
            ("Data Field Formatting", 1),
            ("Calculator Compatibility", 1),
        ]
    );

    assert_eq!(report.spine_coverage.arrows_with_specs, 4);
    assert_eq!(report.spine_coverage.coverage_percentage, 80.0);
    assert_eq!(report.material_distribution[0].material.as_deref(), Some("Carbon"));
    assert_eq!(report.material_distribution[0].count, 3);
}

#[test]
fn test_issue_details_and_fixes() {
    // Given: A catalog with known problems
    let conn = setup_test_db();
    seed_problem_catalog(&conn);

    // When: Validating
    let report = DataValidator::new(&conn).run().unwrap();
    let issues = &report.issues;

    // Then: Each issue carries its description and fix
    let blank = find(issues, 2, "manufacturer");
    assert_eq!(blank.severity, Severity::Critical);
    assert_eq!(
        blank.sql_fix.as_deref(),
        Some("UPDATE arrows SET manufacturer = 'Unknown' WHERE id = 2;")
    );

    let no_specs = find(issues, 2, "spine_specifications");
    assert_eq!(no_specs.issue, "No spine specifications available");

    let zero = find(issues, 3, "spine");
    assert_eq!(zero.issue, "Invalid or missing spine value");
    assert_eq!(
        zero.sql_fix.as_deref(),
        Some("DELETE FROM spine_specifications WHERE id = 13;")
    );

    let lengths = find(issues, 3, "length_options");
    assert!(lengths.issue.contains("European decimal comma"));
    assert_eq!(
        lengths.sql_fix.as_deref(),
        Some("UPDATE spine_specifications SET length_options = '[28,33.5]' WHERE id = 13;")
    );

    let range = find(issues, 5, "spine");
    assert_eq!(range.severity, Severity::Warning);
    assert_eq!(
        range.issue,
        "Spine value 5000 outside realistic range for Aluminum arrows (150-3000)"
    );
    assert!(!range.auto_fixable());

    let missing = find(issues, 5, "manufacturer");
    assert_eq!(missing.issue, "References non-existent manufacturer");
    assert_eq!(
        missing.sql_fix.as_deref(),
        Some("INSERT OR IGNORE INTO manufacturers (name, is_active) VALUES ('Mystery Arrows', 1);")
    );

    let inactive = find(issues, 4, "manufacturer_active_status");
    assert_eq!(inactive.severity, Severity::Info);

    let material = issues
        .iter()
        .find(|i| i.category == "Material Standardization")
        .unwrap();
    assert_eq!(material.issue, "Non-standard material: 'carbon fiber'");
    assert_eq!(
        material.sql_fix.as_deref(),
        Some("UPDATE arrows SET material = 'Carbon' WHERE material = 'carbon fiber';")
    );
}

#[test]
fn test_sql_fix_script_contains_only_executable_fixes() {
    let conn = setup_test_db();
    seed_problem_catalog(&conn);
    let report = DataValidator::new(&conn).run().unwrap();

    let script = sql_fix_script(&report);

    assert!(script.contains("BEGIN TRANSACTION;"));
    assert!(script.contains("INSERT OR IGNORE INTO manufacturers (name, is_active) VALUES ('Mystery Arrows', 1);"));
    assert!(!script.contains("Manual review"));
    // Material Standardization and Calculator Compatibility share one statement
    assert_eq!(
        script
            .matches("UPDATE arrows SET material = 'Carbon' WHERE material = 'carbon fiber';")
            .count(),
        1
    );
    assert!(script.trim_end().ends_with("COMMIT;"));
}

#[test]
fn test_orphaned_specifications_are_reported() {
    // Given: A spine row whose arrow is gone
    let conn = setup_test_db();
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO spine_specifications (id, arrow_id, spine, gpi_weight) VALUES (7, 999, 400, 8.0);
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();

    // When: Validating
    let report = DataValidator::new(&conn).run().unwrap();

    // Then: The orphan is a Database Integrity warning with a DELETE fix
    let orphan = find(&report.issues, 999, "arrow_id_reference");
    assert_eq!(orphan.category, "Database Integrity");
    assert_eq!(orphan.current_value.as_deref(), Some("Orphaned spec ID 7"));
    assert_eq!(
        orphan.sql_fix.as_deref(),
        Some("DELETE FROM spine_specifications WHERE id = 7;")
    );
}

#[test]
fn test_duplicates_and_exclusions() {
    // Given: The same model twice with different casing, and two spellings of another
    let conn = setup_test_db();
    conn.execute_batch(
        r#"
        INSERT INTO manufacturers (name) VALUES ('Easton Archery');
        INSERT INTO arrows (id, manufacturer, model_name, material) VALUES
            (1, 'Easton Archery', 'Axis', 'Carbon'),
            (2, 'Easton Archery', 'AXIS ', 'Carbon'),
            (3, 'Easton Archery', 'FMJ 5mm', 'Carbon / Aluminum'),
            (4, 'Easton Archery', 'FMJ-5mm', 'Carbon / Aluminum');
        INSERT INTO spine_specifications (arrow_id, spine, outer_diameter, gpi_weight) VALUES
            (1, 340, 0.204, 9.5),
            (2, 340, 0.204, 9.5),
            (3, 250, 0.250, 13.0),
            (4, 300, 0.250, 11.9);
        "#,
    )
    .unwrap();

    // When: Validating
    let report = DataValidator::new(&conn).run().unwrap();

    // Then: The exact duplicate, the near duplicate and the shared specs are reported
    let duplicate = find(&report.issues, 2, "duplicate_arrow");
    assert_eq!(duplicate.issue, "Duplicate arrow entry (2 total found)");
    assert!(!duplicate.auto_fixable());

    let near = find(&report.issues, 4, "near_duplicate");
    assert_eq!(near.issue, "Potential duplicate of Arrow ID 3 (FMJ 5mm)");

    let identical = find(&report.issues, 2, "identical_specifications");
    assert!(identical.issue.starts_with("Identical specs to Axis"));
    assert!(report
        .issues
        .iter()
        .all(|i| !(i.field == "near_duplicate" && i.arrow_id == Some(2))));

    // When: Both pairs are marked as distinct arrows
    assert!(mark_not_duplicate(&conn, 2, 1, Some("different straightness"), "tester").unwrap());
    assert!(!mark_not_duplicate(&conn, 1, 2, None, "tester").unwrap());
    mark_not_duplicate(&conn, 3, 4, None, "tester").unwrap();
    let report = DataValidator::new(&conn).run().unwrap();

    // Then: No duplicate issues remain
    assert_eq!(
        report
            .issues
            .iter()
            .filter(|i| i.category == "Duplicate Detection")
            .count(),
        0,
        "{:#?}",
        report.issues
    );
}

#[test]
fn test_mark_not_duplicate_rejects_self_pair() {
    let conn = setup_test_db();

    let err = mark_not_duplicate(&conn, 5, 5, None, "tester").unwrap_err();

    assert_eq!(err.kind(), quiver_core::errors::ExErrorKind::InvalidInput);
}

#[test]
fn test_out_of_range_dimensions_are_warnings() {
    let conn = setup_test_db();
    conn.execute_batch(
        r#"
        INSERT INTO manufacturers (name) VALUES ('Gold Tip');
        INSERT INTO arrows (id, manufacturer, model_name, material) VALUES (1, 'Gold Tip', 'Hunter', 'Carbon');
        INSERT INTO spine_specifications (id, arrow_id, spine, outer_diameter, gpi_weight, length_options) VALUES
            (21, 1, 300, 2.98, 9.8, '[28, 90]'),
            (22, 1, 340, 0.298, 75.0, 'not json');
        "#,
    )
    .unwrap();

    let report = DataValidator::new(&conn).run().unwrap();

    let formatting: Vec<&ValidationIssue> = report
        .issues
        .iter()
        .filter(|i| i.category == "Data Field Formatting")
        .collect();
    assert_eq!(formatting.len(), 4, "{formatting:#?}");
    let diameter = formatting.iter().find(|i| i.field == "outer_diameter").unwrap();
    assert_eq!(diameter.severity, Severity::Warning);
    assert_eq!(diameter.current_value.as_deref(), Some("2.98"));
    let gpi = formatting.iter().find(|i| i.field == "gpi_weight").unwrap();
    assert_eq!(gpi.severity, Severity::Warning);
    let lengths: Vec<&&ValidationIssue> = formatting
        .iter()
        .filter(|i| i.field == "length_options")
        .collect();
    assert_eq!(lengths.len(), 2);
    assert!(lengths.iter().all(|i| i.severity == Severity::Critical));
    assert!(lengths
        .iter()
        .any(|i| i.issue == "Unrealistic length value: 90"));
}
