//! Loop CRUD queries.

use rusqlite::{params, OptionalExtension};

use super::{optional_count_at, optional_timestamp_at, status_at, timestamp_at};
use crate::{
    error::{DatabaseResultExt, LoopzError, Result},
    models::Loop,
    progress::percent_of,
};

const LOOP_COLUMNS: &str = "id, user_id, title, description, status, progress, total_steps, completed_steps, created_at, updated_at, completed_at";
const INSERT_LOOP_SQL: &str = "INSERT INTO loops (id, user_id, title, description, status, progress, total_steps, completed_steps, created_at, updated_at, completed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
const UPDATE_LOOP_SQL: &str = "UPDATE loops SET title = ?1, description = ?2, status = ?3, progress = ?4, total_steps = ?5, completed_steps = ?6, updated_at = ?7, completed_at = ?8 WHERE id = ?9 AND user_id = ?10";
const UPDATE_LOOP_COUNTERS_SQL: &str = "UPDATE loops SET progress = ?1, total_steps = ?2, completed_steps = ?3 WHERE id = ?4 AND user_id = ?5";
const DELETE_LOOP_TASKS_SQL: &str = "DELETE FROM tasks WHERE loop_id = ?1 AND user_id = ?2";
const DELETE_LOOP_SQL: &str = "DELETE FROM loops WHERE id = ?1 AND user_id = ?2";

impl super::Database {
    fn build_loop_from_row(row: &rusqlite::Row) -> rusqlite::Result<Loop> {
        Ok(Loop {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            status: status_at(row, 4)?,
            progress: optional_count_at(row, 5)?.map(|value| value.min(100) as u8),
            total_steps: optional_count_at(row, 6)?,
            completed_steps: optional_count_at(row, 7)?,
            created_at: timestamp_at(row, 8)?,
            updated_at: optional_timestamp_at(row, 9)?,
            completed_at: optional_timestamp_at(row, 10)?,
        })
    }

    /// Lists every loop owned by `user_id`, newest first.
    pub fn list_loops(&self, user_id: &str) -> Result<Vec<Loop>> {
        let query =
            format!("SELECT {LOOP_COLUMNS} FROM loops WHERE user_id = ?1 ORDER BY created_at DESC");
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let loops = stmt
            .query_map(params![user_id], Self::build_loop_from_row)
            .db_context("Failed to query loops")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read loop rows")?;

        Ok(loops)
    }

    /// Retrieves one loop by id.
    pub fn get_loop(&self, user_id: &str, id: &str) -> Result<Option<Loop>> {
        let query = format!("SELECT {LOOP_COLUMNS} FROM loops WHERE id = ?1 AND user_id = ?2");
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        stmt.query_row(params![id, user_id], Self::build_loop_from_row)
            .optional()
            .db_context("Failed to query loop")
    }

    /// Inserts a new loop record.
    pub fn insert_loop(&self, record: &Loop) -> Result<()> {
        self.connection
            .execute(
                INSERT_LOOP_SQL,
                params![
                    record.id,
                    record.user_id,
                    record.title,
                    record.description,
                    record.status.as_str(),
                    record.progress.map(i64::from),
                    record.total_steps.map(i64::from),
                    record.completed_steps.map(i64::from),
                    record.created_at.to_string(),
                    record.updated_at.map(|t| t.to_string()),
                    record.completed_at.map(|t| t.to_string()),
                ],
            )
            .map_err(|e| LoopzError::database("Failed to insert loop").with_source(e))?;
        Ok(())
    }

    /// Overwrites the mutable columns of a loop. Returns whether a row
    /// matched.
    pub fn update_loop(&self, record: &Loop) -> Result<bool> {
        let rows = self
            .connection
            .execute(
                UPDATE_LOOP_SQL,
                params![
                    record.title,
                    record.description,
                    record.status.as_str(),
                    record.progress.map(i64::from),
                    record.total_steps.map(i64::from),
                    record.completed_steps.map(i64::from),
                    record.updated_at.map(|t| t.to_string()),
                    record.completed_at.map(|t| t.to_string()),
                    record.id,
                    record.user_id,
                ],
            )
            .db_context("Failed to update loop")?;
        Ok(rows > 0)
    }

    /// Stores the step counters of a loop and the progress they imply,
    /// leaving every other column alone. Returns whether a row matched.
    pub fn update_loop_counters(
        &self,
        user_id: &str,
        id: &str,
        total: u32,
        completed: u32,
    ) -> Result<bool> {
        let rows = self
            .connection
            .execute(
                UPDATE_LOOP_COUNTERS_SQL,
                params![
                    i64::from(percent_of(completed, total)),
                    i64::from(total),
                    i64::from(completed.min(total)),
                    id,
                    user_id,
                ],
            )
            .db_context("Failed to update loop counters")?;
        Ok(rows > 0)
    }

    /// Deletes a loop with all of its tasks. Returns whether the loop
    /// existed.
    pub fn delete_loop(&mut self, user_id: &str, id: &str) -> Result<bool> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(DELETE_LOOP_TASKS_SQL, params![id, user_id])
            .db_context("Failed to delete loop tasks")?;
        let rows = tx
            .execute(DELETE_LOOP_SQL, params![id, user_id])
            .db_context("Failed to delete loop")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(rows > 0)
    }
}
