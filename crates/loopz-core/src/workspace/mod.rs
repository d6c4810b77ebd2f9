//! Service container wiring the stores, the conversation and the
//! collaborators together.
//!
//! A [`Workspace`] is built once at start-up with [`WorkspaceBuilder`] and
//! shared by reference. It owns one [`LoopStore`], one [`TaskStore`] and
//! one [`ConversationEngine`] and offers the operations that need more than
//! one of them, such as progress views joined with live tasks.
//!
//! # Examples
//!
//! ```rust
//! use loopz_core::{WorkspaceBuilder, params::{CreateLoop, CreateTask}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = WorkspaceBuilder::new()
//!     .in_memory(true)
//!     .with_user("ada")
//!     .build()
//!     .await?;
//!
//! let loop_id = workspace.loops().create(&CreateLoop::new("Read a book")).await?;
//! workspace
//!     .tasks()
//!     .create(&CreateTask::new(loop_id.as_str(), "Pick a book"))
//!     .await?;
//!
//! let view = workspace.loop_with_progress(&loop_id).await;
//! assert_eq!(view.map(|v| v.total_steps), Some(1));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::{
    conversation::ConversationEngine,
    error::Result,
    models::{LoopFilter, LoopWithProgress},
    persistence::{ChangeEvent, Persistence},
    session::Session,
    store::{LoopStore, TaskStore},
};

mod builder;

pub use builder::WorkspaceBuilder;

/// The application's service objects, constructed once.
pub struct Workspace {
    persistence: Arc<dyn Persistence>,
    session: Arc<dyn Session>,
    loops: Arc<LoopStore>,
    tasks: Arc<TaskStore>,
    conversation: Arc<ConversationEngine>,
}

impl Workspace {
    pub(crate) fn new(
        persistence: Arc<dyn Persistence>,
        session: Arc<dyn Session>,
        loops: Arc<LoopStore>,
        tasks: Arc<TaskStore>,
        conversation: Arc<ConversationEngine>,
    ) -> Self {
        Self {
            persistence,
            session,
            loops,
            tasks,
            conversation,
        }
    }

    pub fn loops(&self) -> &Arc<LoopStore> {
        &self.loops
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    pub fn conversation(&self) -> &Arc<ConversationEngine> {
        &self.conversation
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    /// Re-fetches every loop of the session user and the tasks of each.
    pub async fn refresh(&self) -> Result<()> {
        self.loops.fetch_all().await?;
        for record in self.loops.loops().await {
            self.tasks.fetch_by_loop_id(&record.id).await?;
        }
        debug!("Workspace refreshed");
        Ok(())
    }

    /// A loop joined with progress counted from the tasks held in the task
    /// store.
    pub async fn loop_with_progress(&self, id: &str) -> Option<LoopWithProgress> {
        let tasks = self.tasks.get_by_loop_id(id).await;
        self.loops.get_with_progress(id, Some(&tasks)).await
    }

    /// Every loop passing `filter`, newest first, with live progress.
    pub async fn loops_with_progress(&self, filter: &LoopFilter) -> Vec<LoopWithProgress> {
        let mut views = Vec::new();
        for record in self.loops.list(filter).await {
            let tasks = self.tasks.get_by_loop_id(&record.id).await;
            views.push(LoopWithProgress::new(record, Some(&tasks)));
        }
        views
    }

    /// Deletes a loop and drops its tasks from the task store.
    ///
    /// The tasks are evicted locally even when persisting the delete
    /// failed, matching the optimistic removal of the loop itself.
    pub async fn delete_loop(&self, id: &str) -> Result<()> {
        let deleted = self.loops.delete(id).await;
        self.tasks.remove_by_loop_id(id).await;
        deleted
    }

    /// Spawns a background task that re-fetches whatever the persistence
    /// collaborator reports as changed.
    ///
    /// Returns `None` when nobody is signed in. Failed re-fetches are
    /// logged and left in the stores' error state.
    pub fn spawn_change_watcher(&self) -> Option<JoinHandle<()>> {
        let user_id = self.session.user_id()?;
        let mut subscription = self.persistence.subscribe(&user_id);
        let loops = Arc::clone(&self.loops);
        let tasks = Arc::clone(&self.tasks);

        info!("Watching changes for {user_id}");
        Some(tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let outcome = match &event {
                    ChangeEvent::Loops { .. } => loops.fetch_all().await,
                    ChangeEvent::Tasks { loop_id, .. } => tasks.fetch_by_loop_id(loop_id).await,
                };
                if let Err(e) = outcome {
                    warn!("Refresh after {event:?} failed: {e}");
                }
            }
            debug!("Change feed closed");
        }))
    }
}
