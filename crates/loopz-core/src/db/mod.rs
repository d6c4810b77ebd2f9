//! SQLite storage for loops and tasks.
//!
//! Low-level, synchronous database access used by
//! [`crate::persistence::SqlitePersistence`]. One [`Database`] wraps one
//! rusqlite connection; callers open a fresh one per operation on the
//! blocking pool.

use std::path::Path;

use jiff::Timestamp;
use rusqlite::{types::Type, Connection, Row};

use crate::error::{DatabaseResultExt, Result};

pub mod loop_queries;
pub mod migrations;
pub mod task_queries;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens a database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}

/// Reads a required RFC 3339 timestamp column.
fn timestamp_at(row: &Row, index: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(index)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Reads a nullable RFC 3339 timestamp column.
fn optional_timestamp_at(row: &Row, index: usize) -> rusqlite::Result<Option<Timestamp>> {
    row.get::<_, Option<String>>(index)?
        .map(|value| {
            value.parse::<Timestamp>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
            })
        })
        .transpose()
}

/// Reads a text column holding a `FromStr` status.
fn status_at<S>(row: &Row, index: usize) -> rusqlite::Result<S>
where
    S: std::str::FromStr<Err = String>,
{
    let value: String = row.get(index)?;
    value
        .parse::<S>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into()))
}

/// Reads a nullable non-negative integer column.
fn optional_count_at(row: &Row, index: usize) -> rusqlite::Result<Option<u32>> {
    row.get::<_, Option<i64>>(index)?
        .map(|value| {
            u32::try_from(value).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(e))
            })
        })
        .transpose()
}
