//! Core library for the Loopz goal tracker.
//!
//! Loopz organizes goals as *loops*, each holding an ordered list of
//! *tasks*, and pairs them with a chat assistant that can propose new loops
//! from a conversation. This crate holds everything below the user
//! interface:
//!
//! - [`store`]: in-memory [`LoopStore`] and [`TaskStore`] backed by a
//!   [`Persistence`] collaborator
//! - [`progress`]: percentage complete from stored counters or live tasks
//! - [`conversation`]: the [`ConversationEngine`] and its
//!   [`ResponseGenerator`] collaborator
//! - [`navigation`]: the landing/dashboard/detail [`Navigator`]
//! - [`persistence`] and [`db`]: in-memory and SQLite storage with change
//!   notifications
//! - [`display`]: markdown `Display` implementations for terminal output
//!
//! The pieces are wired together once by [`WorkspaceBuilder`] and shared as
//! a [`Workspace`].
//!
//! # Quick Start
//!
//! ```rust
//! use loopz_core::{
//!     WorkspaceBuilder,
//!     models::TaskStatus,
//!     params::{CreateLoop, CreateTask, UpdateTask},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = WorkspaceBuilder::new()
//!     .with_database_path(Some("loopz.db"))
//!     .with_user("ada")
//!     .build()
//!     .await?;
//!
//! let loop_id = workspace.loops().create(&CreateLoop::new("Read a book")).await?;
//! let mut first = None;
//! for title in ["Pick a book", "Read it", "Write notes"] {
//!     let id = workspace
//!         .tasks()
//!         .create(&CreateTask::new(loop_id.as_str(), title))
//!         .await?;
//!     first.get_or_insert(id);
//! }
//! if let Some(id) = first {
//!     workspace
//!         .tasks()
//!         .update(&UpdateTask::status(id, TaskStatus::Completed))
//!         .await?;
//! }
//!
//! if let Some(view) = workspace.loop_with_progress(&loop_id).await {
//!     println!("{view}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod conversation;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod navigation;
pub mod params;
pub mod persistence;
pub mod progress;
pub mod session;
pub mod store;
pub mod workspace;

// Re-export commonly used types
pub use conversation::{
    ConversationConfig, ConversationEngine, Phase, ResponseGenerator, SimulatedResponder,
};
pub use db::Database;
pub use display::{
    CreateResult, DeleteResult, LocalDateTime, LoopOverview, OperationStatus, TaskList,
    Transcript, UpdateResult,
};
pub use error::{LoopzError, Result};
pub use models::{
    AssistantReply, ChatMessage, Loop, LoopFilter, LoopStatus, LoopSuggestion, LoopWithProgress,
    Origin, Task, TaskStatus,
};
pub use navigation::{Layer, Navigator};
pub use params::{CreateLoop, CreateTask, ReorderTasks, UpdateLoop, UpdateTask};
pub use persistence::{
    ChangeEvent, ChangeSubscription, MemoryPersistence, Persistence, SqlitePersistence,
};
pub use progress::{percent_of, progress, ProgressSource};
pub use session::{Session, StaticSession};
pub use store::{LoopStore, TaskStore};
pub use workspace::{Workspace, WorkspaceBuilder};
