//! Data models for loops, tasks and the assistant conversation.
//!
//! This module contains the core domain records of Loopz. Display
//! implementations for these models live in [`crate::display::models`] so
//! that data structures and presentation stay separate.
//!
//! ## Records
//!
//! - [`Loop`]: a goal owned by one user, with optional denormalized step
//!   counters
//! - [`Task`]: one ordered step inside a loop
//! - [`ChatMessage`], [`LoopSuggestion`], [`AssistantReply`]: transient
//!   conversation state
//!
//! # Examples
//!
//! ```rust
//! use loopz_core::models::{Task, TaskStatus};
//! use jiff::Timestamp;
//!
//! let mut task = Task {
//!     id: "t1".to_string(),
//!     loop_id: "l1".to_string(),
//!     user_id: "u1".to_string(),
//!     title: "Book flight".to_string(),
//!     description: None,
//!     status: TaskStatus::Pending,
//!     order: 0,
//!     created_at: Timestamp::now(),
//!     updated_at: None,
//!     completed_at: None,
//! };
//!
//! task.set_status(TaskStatus::Completed, Timestamp::now());
//! assert!(task.completed_at.is_some());
//! ```

mod chat;
mod filters;
mod loops;
mod status;
mod task;

pub use chat::{AssistantReply, ChatMessage, LoopSuggestion, Origin};
pub use filters::LoopFilter;
pub use loops::{Loop, LoopWithProgress};
pub use status::{LoopStatus, TaskStatus};
pub use task::Task;

#[cfg(test)]
mod tests;
