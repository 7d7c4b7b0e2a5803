// Integration tests for the migration framework
// Covers ordering, idempotency, rollback and ledger bookkeeping

use quiver_store::migrations::{
    apply_migrations, Environment, MigrateOptions, MigrationManager, SqlMigration,
};
use rusqlite::Connection;
use tempfile::TempDir;

// Helper to create test DB
fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn ledger_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM database_migrations WHERE success = 1",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

fn seed_setup(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO users (id, google_id, email) VALUES (1, 'g-1', 'archer@example.com');
         INSERT INTO bow_setups (id, user_id, name, bow_type, draw_weight)
             VALUES (1, 1, 'Hunting rig', 'compound', 60);
         INSERT INTO arrows (id, manufacturer, model_name) VALUES (1, 'Easton Archery', 'Axis');",
    )
    .unwrap();
}

fn insert_setup_arrow(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO setup_arrows (setup_id, arrow_id, arrow_length, point_weight)
         VALUES (1, 1, 28.5, 100)",
        [],
    )
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = apply_migrations(&mut conn);

    // Then: All migrations succeed
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    // And: Every catalog, user, journal and validation table exists
    let tables = get_table_names(&conn);
    for expected in [
        "arrows",
        "spine_specifications",
        "manufacturers",
        "manufacturer_equipment_categories",
        "users",
        "bow_setups",
        "setup_arrows",
        "chronograph_data",
        "journal_entries",
        "journal_attachments",
        "manufacturer_spine_charts_enhanced",
        "custom_spine_charts",
        "validation_runs",
        "validation_issues",
        "validation_fixes",
        "duplicate_exclusions",
        "database_migrations",
    ] {
        assert!(tables.contains(&expected.to_string()), "Missing table: {}", expected);
    }

    // And: One ledger row per built-in migration
    assert_eq!(ledger_count(&conn), 11);
}

#[test]
fn test_migration_idempotency() {
    // Given: A database with migrations already applied
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    // When: Migrations are applied again
    apply_migrations(&mut conn).unwrap();

    // Then: Nothing is pending and the ledger is unchanged
    let manager = MigrationManager::builtin(Environment::Development);
    assert!(manager.pending(&conn).unwrap().is_empty());
    assert_eq!(ledger_count(&conn), 11);
}

#[test]
fn test_programmatic_columns_added() {
    // Given / When: A migrated database
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    // Then: Columns from 008 and 009 exist
    use quiver_store::migrations::ddl::column_exists;
    assert!(column_exists(&conn, "arrows", "source_url").unwrap());
    assert!(column_exists(&conn, "arrows", "recommended_use").unwrap());
    assert!(column_exists(&conn, "bow_setups", "draw_length").unwrap());
    assert!(column_exists(&conn, "bow_setups", "insert_weight").unwrap());
}

#[test]
fn test_setup_arrows_allow_repeats_after_010() {
    // Given: A migrated database with one setup
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    seed_setup(&conn);

    // When: The same arrow is added to the setup twice
    insert_setup_arrow(&conn).unwrap();
    let second = insert_setup_arrow(&conn);

    // Then: Both rows are accepted
    assert!(second.is_ok());
}

#[test]
fn test_rollback_010_restores_uniqueness() {
    // Given: A migrated database
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let manager = MigrationManager::builtin(Environment::Development);

    // When: Rolling back to 009
    let report = manager.rollback(&mut conn, "009", false).unwrap();

    // Then: 011 and 010 are undone, newest first, and their ledger rows are gone
    assert_eq!(report.rolled_back, vec!["011".to_string(), "010".to_string()]);
    assert!(report.failed.is_none());
    assert_eq!(ledger_count(&conn), 9);

    // And: setup_arrows rejects a repeated (setup, arrow) pair again
    seed_setup(&conn);
    insert_setup_arrow(&conn).unwrap();
    assert!(insert_setup_arrow(&conn).is_err());

    // And: Migrating again re-applies both
    apply_migrations(&mut conn).unwrap();
    assert_eq!(ledger_count(&conn), 11);
}

#[test]
fn test_rollback_dry_run_changes_nothing() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let manager = MigrationManager::builtin(Environment::Development);

    let report = manager.rollback(&mut conn, "007", true).unwrap();

    assert_eq!(report.would_roll_back, vec!["011", "010", "009", "008"]);
    assert!(report.rolled_back.is_empty());
    assert_eq!(ledger_count(&conn), 11);
}

#[test]
fn test_target_limits_applied_versions() {
    // Given: An empty database
    let mut conn = setup_test_db();
    let manager = MigrationManager::builtin(Environment::Development);

    // When: Migrating up to 003
    let report = manager
        .migrate(
            &mut conn,
            &MigrateOptions {
                target: Some("003".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    // Then: Only 001-003 are applied
    assert_eq!(report.applied, vec!["001", "002", "003"]);
    let status = manager.status(&conn).unwrap();
    assert_eq!(status.applied_count, 3);
    assert_eq!(status.pending_count, 8);
    assert_eq!(status.last_migration.as_deref(), Some("003"));
}

#[test]
fn test_dry_run_lists_without_applying() {
    let mut conn = setup_test_db();
    let manager = MigrationManager::builtin(Environment::Development);

    let report = manager
        .migrate(
            &mut conn,
            &MigrateOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(report.would_apply.len(), 11);
    assert!(report.applied.is_empty());
    assert!(!get_table_names(&conn).contains(&"arrows".to_string()));
}

#[test]
fn test_failed_migration_is_recorded_and_stops_run() {
    // Given: A broken migration after a good one
    let mut conn = setup_test_db();
    let manager = MigrationManager::new(
        vec![
            Box::new(SqlMigration {
                version: "001",
                description: "Good",
                dependencies: &[],
                up_sql: "CREATE TABLE good (id INTEGER);",
                down_sql: "DROP TABLE good;",
            }),
            Box::new(SqlMigration {
                version: "002",
                description: "Broken",
                dependencies: &["001"],
                up_sql: "CREATE TABLE half (id INTEGER); NOT VALID SQL;",
                down_sql: "SELECT 1;",
            }),
            Box::new(SqlMigration {
                version: "003",
                description: "Never reached",
                dependencies: &[],
                up_sql: "CREATE TABLE later (id INTEGER);",
                down_sql: "DROP TABLE later;",
            }),
        ],
        Environment::Development,
    );

    // When: Migrating
    let report = manager.migrate(&mut conn, &MigrateOptions::default()).unwrap();

    // Then: 001 applied, 002 failed and rolled back, 003 not attempted
    assert_eq!(report.applied, vec!["001"]);
    assert_eq!(report.failed.as_ref().map(|f| f.version.as_str()), Some("002"));
    let tables = get_table_names(&conn);
    assert!(tables.contains(&"good".to_string()));
    assert!(!tables.contains(&"half".to_string()));
    assert!(!tables.contains(&"later".to_string()));

    // And: The failure is in the ledger
    let failures: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM database_migrations WHERE version = '002' AND success = 0",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(failures, 1);
}

#[test]
fn test_cycle_is_reported() {
    let conn = setup_test_db();
    let manager = MigrationManager::new(
        vec![
            Box::new(SqlMigration {
                version: "001",
                description: "A",
                dependencies: &["002"],
                up_sql: "SELECT 1;",
                down_sql: "SELECT 1;",
            }),
            Box::new(SqlMigration {
                version: "002",
                description: "B",
                dependencies: &["001"],
                up_sql: "SELECT 1;",
                down_sql: "SELECT 1;",
            }),
        ],
        Environment::Development,
    );

    let err = manager.pending(&conn).err().unwrap();
    assert!(err.message().contains("001 -> 002"));
    assert!(err.message().contains("002 -> 001"));
}

#[test]
fn test_validate_sequence_and_checksums() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let manager = MigrationManager::builtin(Environment::Development);

    let validation = manager.validate_sequence(&conn).unwrap();
    assert!(validation.valid, "{:?}", validation.issues);
    assert!(manager.verify_checksums(&conn).is_ok());

    // When: A ledger checksum is tampered with
    conn.execute(
        "UPDATE database_migrations SET checksum = 'bogus' WHERE version = '004'",
        [],
    )
    .unwrap();

    // Then: Verification fails
    assert!(manager.verify_checksums(&conn).is_err());
}

#[test]
fn test_details_for_known_and_unknown_versions() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    let manager = MigrationManager::builtin(Environment::Development);

    let details = manager.details(&conn, "010").unwrap();
    assert!(details.applied);
    assert_eq!(details.info.dependencies, vec!["003"]);
    assert_eq!(details.history.len(), 1);

    assert!(manager.details(&conn, "999").is_err());
}

#[test]
fn test_backup_written_before_migrating() {
    // Given: A file database and a backup path
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("arrows.db");
    let backup_path = dir.path().join("arrows.db.backup");
    let mut conn = quiver_store::db::open(&db_path).unwrap();
    let manager = MigrationManager::builtin(Environment::Development);

    // When: Migrating with a backup
    let report = manager
        .migrate(
            &mut conn,
            &MigrateOptions {
                backup_path: Some(backup_path.clone()),
                ..Default::default()
            },
        )
        .unwrap();

    // Then: The backup exists and is reported
    assert!(backup_path.exists());
    assert_eq!(report.backup_path.as_deref(), Some(backup_path.as_path()));
}
