//! Database schema initialization.

use crate::error::{DatabaseResultExt, Result};

const SCHEMA_SQL: &str = include_str!("../../assets/schema.sql");

impl super::Database {
    /// Creates any missing tables and indexes from the embedded schema.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        // Cascading task deletes rely on foreign keys
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        self.connection
            .execute_batch(SCHEMA_SQL)
            .db_context("Failed to initialize database schema")?;

        Ok(())
    }
}
