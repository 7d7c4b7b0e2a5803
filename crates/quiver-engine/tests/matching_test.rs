// Integration tests for matching catalog arrows to a bow setup

use quiver_core::matching::{recommendation_report, MatchRequest};
use quiver_core::model::{BowConfiguration, BowType};
use quiver_core::spine::calculate_required_spine;
use quiver_engine::commands::matching::find_matching_arrows;
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    quiver_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

fn insert_arrow(conn: &Connection, manufacturer: &str, model: &str, material: &str, spines: &[i64]) -> i64 {
    conn.execute(
        "INSERT INTO arrows (manufacturer, model_name, material, arrow_type) VALUES (?1, ?2, ?3, 'hunting')",
        rusqlite::params![manufacturer, model, material],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    for spine in spines {
        conn.execute(
            "INSERT INTO spine_specifications (arrow_id, spine, outer_diameter, gpi_weight)
             VALUES (?1, ?2, 0.246, 9.0)",
            rusqlite::params![id, spine],
        )
        .unwrap();
    }
    id
}

fn compound_request() -> (MatchRequest, i64) {
    let request = MatchRequest::new(BowConfiguration::new(60.0, 28.0, BowType::Compound), 28.0)
        .with_max_results(10);
    let spine = calculate_required_spine(&request.bow, &request.spine_request())
        .unwrap()
        .calculated_spine;
    (request, spine)
}

#[test]
fn test_matches_require_spine_options_and_range() {
    // Given: Two full shafts near the calculated spine, one single-spine shaft and one far away
    let conn = setup_test_db();
    let (request, spine) = compound_request();
    let axis = insert_arrow(&conn, "Easton Archery", "Axis", "Carbon", &[spine - 50, spine, spine + 50]);
    let hunter = insert_arrow(&conn, "Gold Tip", "Hunter", "Carbon", &[spine - 40, spine + 10, spine + 60]);
    let single = insert_arrow(&conn, "Victory Archery", "RIP", "Carbon", &[spine]);
    let far = insert_arrow(&conn, "Skylon Archery", "Brixxon", "Carbon", &[spine + 1500, spine + 1600, spine + 1700]);

    // When: Matching
    let matches = find_matching_arrows(&conn, &request).unwrap();

    // Then: Only the shafts with enough spine options in range match
    let ids: Vec<i64> = matches.iter().map(|m| m.arrow_id).collect();
    assert!(ids.contains(&axis));
    assert!(ids.contains(&hunter));
    assert!(!ids.contains(&single));
    assert!(!ids.contains(&far));
    assert!(matches.iter().all(|m| (0.0..=100.0).contains(&m.match_score)));

    let axis_match = matches.iter().find(|m| m.arrow_id == axis).unwrap();
    assert_eq!(axis_match.matched_spine, spine);
    assert_eq!(axis_match.spine_count, 3);
}

#[test]
fn test_relaxes_spine_option_requirement_when_nothing_matches() {
    // Given: Only a single-spine shaft
    let conn = setup_test_db();
    let (request, spine) = compound_request();
    let single = insert_arrow(&conn, "Victory Archery", "RIP", "Carbon", &[spine + 20]);

    // When: Matching
    let matches = find_matching_arrows(&conn, &request).unwrap();

    // Then: It is returned rather than nothing
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].arrow_id, single);
}

#[test]
fn test_preferred_manufacturer_filters_search() {
    let conn = setup_test_db();
    let (request, spine) = compound_request();
    insert_arrow(&conn, "Easton Archery", "Axis", "Carbon", &[spine - 50, spine, spine + 50]);
    let hunter = insert_arrow(&conn, "Gold Tip", "Hunter", "Carbon", &[spine - 40, spine + 10, spine + 60]);
    let request = request.with_preferred_manufacturers(vec!["Gold Tip".to_string()]);

    let matches = find_matching_arrows(&conn, &request).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].arrow_id, hunter);
}

#[test]
fn test_wood_request_searches_wood_makers_in_pounds() {
    // Given: A cedar shaft in pound spines and a carbon shaft
    let conn = setup_test_db();
    let request = MatchRequest::new(BowConfiguration::new(45.0, 28.0, BowType::Traditional), 29.0)
        .with_material("wood")
        .with_max_results(5);
    let pounds = calculate_required_spine(&request.bow, &request.spine_request())
        .unwrap()
        .calculated_spine;
    let cedar = insert_arrow(&conn, "Port Orford Cedar Shafts", "Premium", "Wood", &[pounds - 5, pounds, pounds + 5]);
    let carbon = insert_arrow(&conn, "Easton Archery", "Axis", "Carbon", &[400, 500, 600]);

    // When: Matching
    let matches = find_matching_arrows(&conn, &request).unwrap();

    // Then: Only the wood shaft is returned
    let ids: Vec<i64> = matches.iter().map(|m| m.arrow_id).collect();
    assert_eq!(ids, vec![cedar]);
    assert!(!ids.contains(&carbon));

    let report = recommendation_report(&matches, &request);
    assert!(report.contains("Premium"));
}

#[test]
fn test_invalid_bow_is_rejected() {
    let conn = setup_test_db();
    let request = MatchRequest::new(BowConfiguration::new(0.0, 28.0, BowType::Compound), 28.0);

    let err = find_matching_arrows(&conn, &request).unwrap_err();

    assert!(!err.message().is_empty());
}

#[test]
fn test_empty_catalog_yields_no_matches() {
    let conn = setup_test_db();
    let (request, _) = compound_request();

    let matches = find_matching_arrows(&conn, &request).unwrap();

    assert!(matches.is_empty());
    assert!(recommendation_report(&matches, &request)
        .contains(quiver_core::matching::report::NO_MATCHES));
}
