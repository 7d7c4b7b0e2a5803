// Integration tests for importing processed extraction files

use quiver_store::import::{import_directory, import_document};
use quiver_store::repo::{ArrowRepo, ManufacturerRepo};
use quiver_store::ArrowDocument;
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    quiver_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

fn easton_document(description: &str) -> serde_json::Value {
    json!({
        "manufacturer": "Easton Archery",
        "total_arrows": 2,
        "arrows": [
            {
                "model_name": "Axis 4mm",
                "manufacturer": "Easton",
                "material": "Carbon",
                "description": description,
                "arrow_type": "hunting",
                "spine_specifications": [
                    {"spine": 340, "outer_diameter": 0.204, "inner_diameter": 0.166, "gpi_weight": 9.5,
                     "length_options": [30.0, 31.0]},
                    {"spine": "400", "outer_diameter": 0.204, "gpi_weight": 8.8}
                ]
            },
            {
                "model_name": "Unknown",
                "material": "Carbon",
                "spine_specifications": []
            }
        ]
    })
}

#[test]
fn test_import_directory_inserts_arrows_and_specs() {
    // Given: A processed directory with one file
    let conn_dir = TempDir::new().unwrap();
    write_json(conn_dir.path(), "easton_arrows.json", &easton_document("Hunting shaft"));
    let mut conn = setup_test_db();

    // When: The directory is imported
    let summary = import_directory(&mut conn, conn_dir.path()).unwrap();

    // Then: The valid arrow and both spines are stored, the placeholder is skipped
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.arrows_inserted, 1);
    assert_eq!(summary.arrows_skipped, 1);
    assert_eq!(summary.specs_added, 2);
    assert_eq!(count(&conn, "arrows"), 1);
    assert_eq!(count(&conn, "spine_specifications"), 2);

    // And: The file-level manufacturer is used and registered
    let arrows = ArrowRepo::arrows_by_manufacturer(&conn, "easton").unwrap();
    assert_eq!(arrows[0].manufacturer, "Easton Archery");
    assert!(ManufacturerRepo::get(&conn, "Easton Archery").unwrap().is_some());

    // And: Diameter category comes from the inner diameter
    let specs = &arrows[0].spine_specifications;
    assert_eq!(specs[0].spine, Some(340));
    assert_eq!(specs[0].diameter_category.map(|c| c.as_str()), Some("ultra_thin"));
    assert_eq!(specs[0].length_options, vec![30.0, 31.0]);
}

#[test]
fn test_import_twice_inserts_nothing_new() {
    // Given: A file imported once
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "easton_arrows.json", &easton_document("Hunting shaft"));
    let mut conn = setup_test_db();
    import_directory(&mut conn, dir.path()).unwrap();

    // When: It is imported again
    let summary = import_directory(&mut conn, dir.path()).unwrap();

    // Then: Nothing new is written
    assert_eq!(summary.arrows_inserted, 0);
    assert_eq!(summary.arrows_updated, 0);
    assert_eq!(summary.arrows_unchanged, 1);
    assert_eq!(summary.specs_added, 0);
    assert_eq!(count(&conn, "spine_specifications"), 2);
}

#[test]
fn test_longer_description_updates_arrow() {
    // Given: An arrow imported with a short description
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "easton_arrows.json", &easton_document("Short"));
    let mut conn = setup_test_db();
    import_directory(&mut conn, dir.path()).unwrap();

    // When: The same arrow arrives with a longer description
    write_json(
        dir.path(),
        "easton_arrows.json",
        &easton_document("Short, plus a much longer explanation of the shaft"),
    );
    let summary = import_directory(&mut conn, dir.path()).unwrap();

    // Then: The arrow is updated in place
    assert_eq!(summary.arrows_updated, 1);
    let arrows = ArrowRepo::arrows_by_manufacturer(&conn, "Easton Archery").unwrap();
    assert_eq!(arrows.len(), 1);
    assert!(arrows[0]
        .description
        .as_deref()
        .unwrap()
        .contains("much longer"));
}

#[test]
fn test_bad_and_empty_files_do_not_stop_the_run() {
    // Given: An invalid file, an empty file and a good file
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a_broken.json"), "{ not json").unwrap();
    write_json(
        dir.path(),
        "b_empty.json",
        &json!({"manufacturer": "Nobody", "total_arrows": 0, "arrows": []}),
    );
    write_json(dir.path(), "c_easton.json", &easton_document("Hunting shaft"));
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let mut conn = setup_test_db();

    // When: The directory is imported
    let summary = import_directory(&mut conn, dir.path()).unwrap();

    // Then: Each file is accounted for
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.errors[0].file, "a_broken.json");
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.arrows_inserted, 1);
}

#[test]
fn test_wood_material_is_normalised() {
    let mut conn = setup_test_db();
    let document: ArrowDocument = serde_json::from_value(json!({
        "manufacturer": "Port Orford Cedar Shafts",
        "arrows": [{
            "model_name": "Premium Cedar",
            "material": "Port Orford Cedar",
            "spine_specifications": [
                {"spine": "40-45", "outer_diameter": 0.344, "gpi_weight": 11.0},
                {"spine": "50-55", "outer_diameter": 0.344, "gpi_weight": 11.5}
            ]
        }]
    }))
    .unwrap();

    let summary = import_document(&mut conn, &document).unwrap();

    assert_eq!(summary.specs_added, 2);
    let arrow = &ArrowRepo::arrows_by_manufacturer(&conn, "Cedar").unwrap()[0];
    assert_eq!(arrow.material.as_deref(), Some("Wood"));
    assert_eq!(arrow.spine_values(), vec![40, 50]);
}

#[test]
fn test_blank_manufacturer_falls_back_to_unknown() {
    // Given: A file whose manufacturer is only whitespace
    let mut conn = setup_test_db();
    let document: ArrowDocument = serde_json::from_value(json!({
        "manufacturer": "   ",
        "arrows": [{
            "model_name": "Nameless 500",
            "material": "Carbon",
            "spine_specifications": [
                {"spine": 500, "outer_diameter": 0.295, "gpi_weight": 7.9}
            ]
        }]
    }))
    .unwrap();

    // When: It is imported
    let summary = import_document(&mut conn, &document).unwrap();

    // Then: The arrow is filed under "Unknown" and no blank manufacturer exists
    assert_eq!(summary.arrows_inserted, 1);
    let stored: String = conn
        .query_row(
            "SELECT manufacturer FROM arrows WHERE model_name = 'Nameless 500'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "Unknown");
    assert!(ManufacturerRepo::get(&conn, "Unknown").unwrap().is_some());
    assert!(ManufacturerRepo::get(&conn, "").unwrap().is_none());
}

#[test]
fn test_material_change_replaces_optional_columns() {
    // Given: A stored arrow with a type and carbon content
    let mut conn = setup_test_db();
    let first: ArrowDocument = serde_json::from_value(json!({
        "manufacturer": "Victory Archery",
        "arrows": [{
            "model_name": "VAP TKO",
            "material": "Carbon",
            "carbon_content": "100% carbon",
            "arrow_type": "hunting",
            "description": "Small diameter hunting shaft"
        }]
    }))
    .unwrap();
    import_document(&mut conn, &first).unwrap();

    // When: It is re-imported with a new material and no optional fields
    let second: ArrowDocument = serde_json::from_value(json!({
        "manufacturer": "Victory Archery",
        "arrows": [{
            "model_name": "VAP TKO",
            "material": "Aluminum"
        }]
    }))
    .unwrap();
    let summary = import_document(&mut conn, &second).unwrap();

    // Then: The optional columns follow the new data, the description is kept
    assert_eq!(summary.arrows_updated, 1);
    let arrow = &ArrowRepo::arrows_by_manufacturer(&conn, "Victory Archery").unwrap()[0];
    assert_eq!(arrow.material.as_deref(), Some("Aluminum"));
    assert_eq!(arrow.carbon_content, None);
    assert_eq!(arrow.arrow_type, None);
    assert_eq!(
        arrow.description.as_deref(),
        Some("Small diameter hunting shaft")
    );
}
