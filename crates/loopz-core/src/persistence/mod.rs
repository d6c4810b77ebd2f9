//! Persistence collaborator for loops and tasks.
//!
//! Stores never talk to a database directly. They hold an
//! `Arc<dyn Persistence>` and call it at their suspension points; everything
//! else they do is in memory. Two backends ship with the crate:
//!
//! - [`MemoryPersistence`]: process-local tables, used by tests and the
//!   `--in-memory` CLI mode
//! - [`SqlitePersistence`]: a rusqlite database file, one connection per
//!   call on the blocking pool
//!
//! Both publish a [`ChangeEvent`] after every successful write so that
//! subscribers can re-fetch.

use async_trait::async_trait;
use log::debug;
use tokio::sync::broadcast;

use crate::{
    error::Result,
    models::{Loop, Task},
};

mod memory;
mod sqlite;

pub use memory::MemoryPersistence;
pub use sqlite::SqlitePersistence;

const CHANGE_FEED_CAPACITY: usize = 64;

/// Authoritative storage for loop and task records.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// All loops owned by `user_id`, newest first.
    async fn list_loops(&self, user_id: &str) -> Result<Vec<Loop>>;

    async fn insert_loop(&self, record: &Loop) -> Result<()>;

    /// Replaces the stored loop with the same id. Unknown ids are ignored.
    async fn update_loop(&self, record: &Loop) -> Result<()>;

    /// Stores the step counters of a loop and the progress derived from
    /// them without touching its other fields. Unknown ids are ignored.
    async fn update_loop_counters(
        &self,
        user_id: &str,
        id: &str,
        total: u32,
        completed: u32,
    ) -> Result<()>;

    /// Deletes a loop and every task under it. Unknown ids are ignored.
    async fn delete_loop(&self, user_id: &str, id: &str) -> Result<()>;

    /// Tasks of one loop, ascending by order.
    async fn list_tasks(&self, user_id: &str, loop_id: &str) -> Result<Vec<Task>>;

    async fn insert_task(&self, task: &Task) -> Result<()>;

    /// Replaces every given task record in one atomic write.
    async fn update_tasks(&self, tasks: &[Task]) -> Result<()>;

    /// Deletes one task and replaces the `renumbered` records of its
    /// siblings in the same atomic write. Unknown ids are ignored and
    /// nothing is written for them.
    async fn delete_task(&self, user_id: &str, id: &str, renumbered: &[Task]) -> Result<()>;

    /// Change notifications for records owned by `user_id`.
    fn subscribe(&self, user_id: &str) -> ChangeSubscription;
}

/// A change to persisted records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Some loop of the user was created, edited or deleted
    Loops { user_id: String },
    /// Some task of one loop was created, edited, reordered or deleted
    Tasks { user_id: String, loop_id: String },
}

impl ChangeEvent {
    pub fn user_id(&self) -> &str {
        match self {
            ChangeEvent::Loops { user_id } | ChangeEvent::Tasks { user_id, .. } => user_id,
        }
    }
}

/// Broadcast side of the change notifications, shared by the backends.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { sender }
    }

    /// Publishes an event; having no subscriber is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            debug!("Change event dropped: no subscribers");
        }
    }

    pub fn loops_changed(&self, user_id: &str) {
        self.publish(ChangeEvent::Loops {
            user_id: user_id.to_string(),
        });
    }

    pub fn tasks_changed(&self, user_id: &str, loop_id: &str) {
        self.publish(ChangeEvent::Tasks {
            user_id: user_id.to_string(),
            loop_id: loop_id.to_string(),
        });
    }

    pub fn subscribe(&self, user_id: &str) -> ChangeSubscription {
        ChangeSubscription {
            user_id: user_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the change notifications for one user.
#[derive(Debug)]
pub struct ChangeSubscription {
    user_id: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Waits for the next event about this user's records.
    ///
    /// When the subscriber fell behind and events were dropped, a
    /// [`ChangeEvent::Loops`] is returned so the caller re-fetches
    /// everything. Returns `None` once the backend is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.user_id() == self.user_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Change subscription lagged by {skipped} events");
                    return Some(ChangeEvent::Loops {
                        user_id: self.user_id.clone(),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
