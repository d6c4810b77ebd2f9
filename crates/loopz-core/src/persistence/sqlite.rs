//! SQLite persistence backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::task;

use super::{ChangeFeed, ChangeSubscription, Persistence};
use crate::{
    db::Database,
    error::{join_error, LoopzError, Result},
    models::{Loop, Task},
};

/// Stores loops and tasks in a SQLite database file.
///
/// Every call opens its own connection on the blocking thread pool, so the
/// async runtime is never blocked on disk I/O.
#[derive(Debug)]
pub struct SqlitePersistence {
    db_path: PathBuf,
    feed: ChangeFeed,
}

impl SqlitePersistence {
    /// Opens (creating when missing) the database at `path` and makes sure
    /// the schema is current.
    ///
    /// # Errors
    ///
    /// Returns `LoopzError::FileSystem` if the parent directory cannot be
    /// created and `LoopzError::Database` if schema initialization fails.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LoopzError::FileSystem {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), LoopzError>(())
        })
        .await
        .map_err(join_error)??;

        debug!("Opened loop database at {}", db_path.display());
        Ok(Self {
            db_path,
            feed: ChangeFeed::new(),
        })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn with_database<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            operation(&mut db)
        })
        .await
        .map_err(join_error)?
    }
}

#[async_trait]
impl Persistence for SqlitePersistence {
    async fn list_loops(&self, user_id: &str) -> Result<Vec<Loop>> {
        let user_id = user_id.to_string();
        self.with_database(move |db| db.list_loops(&user_id)).await
    }

    async fn insert_loop(&self, record: &Loop) -> Result<()> {
        let owned = record.clone();
        self.with_database(move |db| db.insert_loop(&owned)).await?;
        self.feed.loops_changed(&record.user_id);
        Ok(())
    }

    async fn update_loop(&self, record: &Loop) -> Result<()> {
        let owned = record.clone();
        let updated = self.with_database(move |db| db.update_loop(&owned)).await?;
        if updated {
            self.feed.loops_changed(&record.user_id);
        }
        Ok(())
    }

    async fn update_loop_counters(
        &self,
        user_id: &str,
        id: &str,
        total: u32,
        completed: u32,
    ) -> Result<()> {
        let (owner, loop_id) = (user_id.to_string(), id.to_string());
        let updated = self
            .with_database(move |db| db.update_loop_counters(&owner, &loop_id, total, completed))
            .await?;
        if updated {
            self.feed.loops_changed(user_id);
        }
        Ok(())
    }

    async fn delete_loop(&self, user_id: &str, id: &str) -> Result<()> {
        let (owner, loop_id) = (user_id.to_string(), id.to_string());
        let removed = self
            .with_database(move |db| db.delete_loop(&owner, &loop_id))
            .await?;
        if removed {
            self.feed.loops_changed(user_id);
            self.feed.tasks_changed(user_id, id);
        }
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, loop_id: &str) -> Result<Vec<Task>> {
        let (owner, loop_id) = (user_id.to_string(), loop_id.to_string());
        self.with_database(move |db| db.list_tasks(&owner, &loop_id))
            .await
    }

    async fn insert_task(&self, task: &Task) -> Result<()> {
        let owned = task.clone();
        self.with_database(move |db| db.insert_task(&owned)).await?;
        self.feed.tasks_changed(&task.user_id, &task.loop_id);
        Ok(())
    }

    async fn update_tasks(&self, tasks: &[Task]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let owned = tasks.to_vec();
        self.with_database(move |db| db.update_tasks(&owned)).await?;

        let mut notified: Vec<(&str, &str)> = Vec::new();
        for task in tasks {
            let key = (task.user_id.as_str(), task.loop_id.as_str());
            if !notified.contains(&key) {
                self.feed.tasks_changed(key.0, key.1);
                notified.push(key);
            }
        }
        Ok(())
    }

    async fn delete_task(&self, user_id: &str, id: &str, renumbered: &[Task]) -> Result<()> {
        let (owner, task_id) = (user_id.to_string(), id.to_string());
        let renumbered = renumbered.to_vec();
        let loop_id = self
            .with_database(move |db| db.delete_task(&owner, &task_id, &renumbered))
            .await?;
        if let Some(loop_id) = loop_id {
            self.feed.tasks_changed(user_id, &loop_id);
        }
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> ChangeSubscription {
        self.feed.subscribe(user_id)
    }
}
