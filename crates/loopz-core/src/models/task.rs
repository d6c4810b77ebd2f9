//! Task records.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::TaskStatus;

/// A single actionable step belonging to exactly one loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// ID of the parent loop
    pub loop_id: String,

    /// Identifier of the owning user
    pub user_id: String,

    /// Brief title of the task
    pub title: String,

    /// Optional detailed description
    pub description: Option<String>,

    /// Current status of the task
    #[serde(default)]
    pub status: TaskStatus,

    /// Position of the task within its loop (0-indexed)
    pub order: u32,

    /// Timestamp when the task was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the task was last updated (UTC)
    pub updated_at: Option<Timestamp>,

    /// Timestamp of the first transition into `completed`
    pub completed_at: Option<Timestamp>,
}

impl Task {
    /// Whether the task counts as done for progress purposes.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Applies a status change at `now`.
    ///
    /// The completion timestamp is recorded on the first entry into
    /// `completed` and is never cleared or overwritten afterwards.
    pub fn set_status(&mut self, status: TaskStatus, now: Timestamp) {
        if status == TaskStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.status = status;
    }
}
