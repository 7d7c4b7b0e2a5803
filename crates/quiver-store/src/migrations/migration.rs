//! The migration contract and the embedded-SQL implementation

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::migrations::checksums::migration_checksum;
use crate::migrations::environment::{Environment, EnvironmentScope};
use rusqlite::Transaction;

/// A versioned schema or data change
///
/// `up` and `down` run inside a transaction owned by the manager; they must
/// not commit.
pub trait Migration {
    /// Zero-padded version, compared as a string
    fn version(&self) -> &str;

    fn description(&self) -> &str;

    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    fn environments(&self) -> EnvironmentScope {
        EnvironmentScope::All
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()>;

    fn down(&self, tx: &Transaction<'_>) -> Result<()>;

    fn can_run_in(&self, env: Environment) -> bool {
        self.environments().allows(env)
    }

    fn checksum(&self) -> String {
        migration_checksum(self.version(), self.description(), self.dependencies())
    }
}

/// Migration backed by an embedded `.sql` / `.down.sql` pair
pub struct SqlMigration {
    pub version: &'static str,
    pub description: &'static str,
    pub dependencies: &'static [&'static str],
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

impl Migration for SqlMigration {
    fn version(&self) -> &str {
        self.version
    }

    fn description(&self) -> &str {
        self.description
    }

    fn dependencies(&self) -> &[&'static str] {
        self.dependencies
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.up_sql).map_err(from_rusqlite)
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.down_sql).map_err(from_rusqlite)
    }
}
