//! Process-local persistence backend.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChangeFeed, ChangeSubscription, Persistence};
use crate::{
    error::{LoopzError, Result},
    models::{Loop, Task},
};

#[derive(Debug, Default)]
struct Tables {
    loops: Vec<Loop>,
    tasks: Vec<Task>,
}

/// Keeps every record in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    tables: RwLock<Tables>,
    feed: ChangeFeed,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn list_loops(&self, user_id: &str) -> Result<Vec<Loop>> {
        let tables = self.tables.read().await;
        let mut loops: Vec<Loop> = tables
            .loops
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        loops.reverse();
        loops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loops)
    }

    async fn insert_loop(&self, record: &Loop) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            if tables.loops.iter().any(|existing| existing.id == record.id) {
                return Err(LoopzError::persistence(format!(
                    "Loop {} already exists",
                    record.id
                )));
            }
            tables.loops.push(record.clone());
        }
        self.feed.loops_changed(&record.user_id);
        Ok(())
    }

    async fn update_loop(&self, record: &Loop) -> Result<()> {
        let updated = {
            let mut tables = self.tables.write().await;
            match tables
                .loops
                .iter_mut()
                .find(|existing| existing.id == record.id && existing.user_id == record.user_id)
            {
                Some(existing) => {
                    *existing = record.clone();
                    true
                }
                None => false,
            }
        };
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
        let updated = {
            let mut tables = self.tables.write().await;
            match tables
                .loops
                .iter_mut()
                .find(|existing| existing.id == id && existing.user_id == user_id)
            {
                Some(existing) => {
                    existing.set_counters(total, completed);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.feed.loops_changed(user_id);
        }
        Ok(())
    }

    async fn delete_loop(&self, user_id: &str, id: &str) -> Result<()> {
        let removed = {
            let mut tables = self.tables.write().await;
            let before = tables.loops.len();
            tables
                .loops
                .retain(|record| !(record.id == id && record.user_id == user_id));
            let removed = tables.loops.len() != before;
            if removed {
                tables.tasks.retain(|task| task.loop_id != id);
            }
            removed
        };
        if removed {
            self.feed.loops_changed(user_id);
            self.feed.tasks_changed(user_id, id);
        }
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, loop_id: &str) -> Result<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|task| task.user_id == user_id && task.loop_id == loop_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.order);
        Ok(tasks)
    }

    async fn insert_task(&self, task: &Task) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            if !tables.loops.iter().any(|record| record.id == task.loop_id) {
                return Err(LoopzError::persistence(format!(
                    "Loop {} does not exist",
                    task.loop_id
                )));
            }
            if tables.tasks.iter().any(|existing| existing.id == task.id) {
                return Err(LoopzError::persistence(format!(
                    "Task {} already exists",
                    task.id
                )));
            }
            tables.tasks.push(task.clone());
        }
        self.feed.tasks_changed(&task.user_id, &task.loop_id);
        Ok(())
    }

    async fn update_tasks(&self, tasks: &[Task]) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            for task in tasks {
                if let Some(existing) = tables
                    .tasks
                    .iter_mut()
                    .find(|existing| existing.id == task.id && existing.user_id == task.user_id)
                {
                    *existing = task.clone();
                }
            }
        }
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
        let loop_id = {
            let mut tables = self.tables.write().await;
            let position = tables
                .tasks
                .iter()
                .position(|task| task.id == id && task.user_id == user_id);
            let loop_id = position.map(|index| tables.tasks.remove(index).loop_id);
            if loop_id.is_some() {
                for task in renumbered {
                    if let Some(existing) = tables
                        .tasks
                        .iter_mut()
                        .find(|existing| existing.id == task.id && existing.user_id == task.user_id)
                    {
                        *existing = task.clone();
                    }
                }
            }
            loop_id
        };
        if let Some(loop_id) = loop_id {
            self.feed.tasks_changed(user_id, &loop_id);
        }
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> ChangeSubscription {
        self.feed.subscribe(user_id)
    }
}
