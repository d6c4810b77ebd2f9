//! Task CRUD queries.

use rusqlite::{params, OptionalExtension, Transaction};

use super::{optional_timestamp_at, status_at, timestamp_at};
use crate::{
    error::{DatabaseResultExt, LoopzError, Result},
    models::Task,
};

const TASK_COLUMNS: &str = "id, loop_id, user_id, title, description, status, task_order, created_at, updated_at, completed_at";
const CHECK_LOOP_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM loops WHERE id = ?1)";
const INSERT_TASK_SQL: &str = "INSERT INTO tasks (id, loop_id, user_id, title, description, status, task_order, created_at, updated_at, completed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
const UPDATE_TASK_SQL: &str = "UPDATE tasks SET title = ?1, description = ?2, status = ?3, task_order = ?4, updated_at = ?5, completed_at = ?6 WHERE id = ?7 AND user_id = ?8";
const SELECT_TASK_LOOP_SQL: &str = "SELECT loop_id FROM tasks WHERE id = ?1 AND user_id = ?2";
const DELETE_TASK_SQL: &str = "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2";

impl super::Database {
    fn build_task_from_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            loop_id: row.get(1)?,
            user_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: status_at(row, 5)?,
            order: row.get::<_, i64>(6)? as u32,
            created_at: timestamp_at(row, 7)?,
            updated_at: optional_timestamp_at(row, 8)?,
            completed_at: optional_timestamp_at(row, 9)?,
        })
    }

    /// Lists the tasks of one loop in ascending order.
    pub fn list_tasks(&self, user_id: &str, loop_id: &str) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE loop_id = ?1 AND user_id = ?2 ORDER BY task_order"
        );
        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let tasks = stmt
            .query_map(params![loop_id, user_id], Self::build_task_from_row)
            .db_context("Failed to query tasks")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read task rows")?;

        Ok(tasks)
    }

    /// Inserts a task under an existing loop.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        let loop_exists: bool = self
            .connection
            .query_row(CHECK_LOOP_EXISTS_SQL, params![task.loop_id], |row| {
                row.get(0)
            })
            .db_context("Failed to check loop existence")?;

        if !loop_exists {
            return Err(LoopzError::persistence(format!(
                "Loop {} does not exist",
                task.loop_id
            )));
        }

        self.connection
            .execute(
                INSERT_TASK_SQL,
                params![
                    task.id,
                    task.loop_id,
                    task.user_id,
                    task.title,
                    task.description,
                    task.status.as_str(),
                    i64::from(task.order),
                    task.created_at.to_string(),
                    task.updated_at.map(|t| t.to_string()),
                    task.completed_at.map(|t| t.to_string()),
                ],
            )
            .db_context("Failed to insert task")?;
        Ok(())
    }

    /// Overwrites the mutable columns of every given task in one
    /// transaction.
    pub fn update_tasks(&mut self, tasks: &[Task]) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        Self::write_tasks(&tx, tasks)?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Deletes one task and rewrites `renumbered` (its former siblings with
    /// their closed-up order) in the same transaction.
    ///
    /// Returns the id of the loop the task belonged to, or `None` when no
    /// such task exists, in which case nothing is written.
    pub fn delete_task(
        &mut self,
        user_id: &str,
        id: &str,
        renumbered: &[Task],
    ) -> Result<Option<String>> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let loop_id: Option<String> = tx
            .query_row(SELECT_TASK_LOOP_SQL, params![id, user_id], |row| row.get(0))
            .optional()
            .db_context("Failed to look up task")?;
        let Some(loop_id) = loop_id else {
            return Ok(None);
        };

        tx.execute(DELETE_TASK_SQL, params![id, user_id])
            .db_context("Failed to delete task")?;
        Self::write_tasks(&tx, renumbered)?;
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(Some(loop_id))
    }

    fn write_tasks(tx: &Transaction<'_>, tasks: &[Task]) -> Result<()> {
        let mut stmt = tx
            .prepare(UPDATE_TASK_SQL)
            .db_context("Failed to prepare task update")?;
        for task in tasks {
            stmt.execute(params![
                task.title,
                task.description,
                task.status.as_str(),
                i64::from(task.order),
                task.updated_at.map(|t| t.to_string()),
                task.completed_at.map(|t| t.to_string()),
                task.id,
                task.user_id,
            ])
            .db_context("Failed to update task")?;
        }
        Ok(())
    }
}
