//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

use crate::migrations::migration::SqlMigration;

/// All embedded SQL migrations in version order
pub fn sql_migrations() -> Vec<SqlMigration> {
    vec![
        SqlMigration {
            version: "001",
            description: "Arrow catalog",
            dependencies: &[],
            up_sql: include_str!("../../migrations/001_arrow_catalog.sql"),
            down_sql: include_str!("../../migrations/001_arrow_catalog.down.sql"),
        },
        SqlMigration {
            version: "002",
            description: "Manufacturers",
            dependencies: &[],
            up_sql: include_str!("../../migrations/002_manufacturers.sql"),
            down_sql: include_str!("../../migrations/002_manufacturers.down.sql"),
        },
        SqlMigration {
            version: "003",
            description: "Users and bow setups",
            dependencies: &["001"],
            up_sql: include_str!("../../migrations/003_users_bow_setups.sql"),
            down_sql: include_str!("../../migrations/003_users_bow_setups.down.sql"),
        },
        SqlMigration {
            version: "004",
            description: "Chronograph data",
            dependencies: &["003"],
            up_sql: include_str!("../../migrations/004_chronograph_data.sql"),
            down_sql: include_str!("../../migrations/004_chronograph_data.down.sql"),
        },
        SqlMigration {
            version: "005",
            description: "Journal system",
            dependencies: &["003"],
            up_sql: include_str!("../../migrations/005_journal_system.sql"),
            down_sql: include_str!("../../migrations/005_journal_system.down.sql"),
        },
        SqlMigration {
            version: "006",
            description: "Spine charts",
            dependencies: &[],
            up_sql: include_str!("../../migrations/006_spine_charts.sql"),
            down_sql: include_str!("../../migrations/006_spine_charts.down.sql"),
        },
        SqlMigration {
            version: "007",
            description: "Validation schema",
            dependencies: &["001"],
            up_sql: include_str!("../../migrations/007_validation_schema.sql"),
            down_sql: include_str!("../../migrations/007_validation_schema.down.sql"),
        },
    ]
}
