// Engine commands own their start/end events

use quiver_core::logging_facility::test_capture::init_test_capture;
use quiver_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE};
use quiver_engine::commands::catalog::arrow_details;
use quiver_engine::commands::validate::validate_all;
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    quiver_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

#[test]
fn test_commands_emit_one_start_and_one_terminal_event() {
    let capture = init_test_capture();
    let conn = setup_test_db();

    // When: A lookup fails
    arrow_details(&conn, 404).unwrap_err();

    // Then: One start and one error event, carrying the stable error code
    let events = capture.events_for_op("arrow_details");
    assert_eq!(
        events
            .iter()
            .filter(|e| e.event.as_deref() == Some(EVENT_START))
            .count(),
        1
    );
    let errors: Vec<_> = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].fields.get(FIELD_ERR_CODE).map(String::as_str),
        Some("ERR_NOT_FOUND")
    );
    assert!(events
        .iter()
        .all(|e| e.event.as_deref() != Some(EVENT_END)));

    // When: A validation run succeeds
    validate_all(&conn, "manual", false).unwrap();

    // Then: It is bracketed by exactly one start and one end
    let events = capture.events_for_op("validate_all");
    assert_eq!(
        events
            .iter()
            .map(|e| e.event.as_deref())
            .filter(|e| *e == Some(EVENT_START) || *e == Some(EVENT_END))
            .collect::<Vec<_>>(),
        vec![Some(EVENT_START), Some(EVENT_END)]
    );
    let end = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .unwrap();
    assert_eq!(end.fields.get("total_issues").map(String::as_str), Some("0"));
}
