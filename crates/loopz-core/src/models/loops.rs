//! Loop records and their progress-joined view.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::LoopStatus;
use crate::progress::percent_of;

/// A user-defined goal containing an ordered set of tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Loop {
    /// Unique identifier for the loop
    pub id: String,

    /// Identifier of the owning user
    pub user_id: String,

    /// Title of the loop (never empty)
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: LoopStatus,

    /// Denormalized progress percentage, if the backend keeps one
    pub progress: Option<u8>,

    /// Denormalized step counter: all steps
    pub total_steps: Option<u32>,

    /// Denormalized step counter: completed steps
    pub completed_steps: Option<u32>,

    /// Timestamp when the loop was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp of the last edit (UTC)
    pub updated_at: Option<Timestamp>,

    /// Timestamp when the loop first reached `completed`
    pub completed_at: Option<Timestamp>,
}

impl Loop {
    /// Stored step counters, present only when both are recorded.
    pub fn counters(&self) -> Option<(u32, u32)> {
        match (self.total_steps, self.completed_steps) {
            (Some(total), Some(completed)) => Some((total, completed)),
            _ => None,
        }
    }

    /// Whether the stored counters satisfy `0 <= completed <= total`.
    pub fn counters_consistent(&self) -> bool {
        self.counters()
            .map_or(true, |(total, completed)| completed <= total)
    }

    /// Records step counters and the progress percentage they imply.
    ///
    /// `completed` is clamped to `total`.
    pub fn set_counters(&mut self, total: u32, completed: u32) {
        let completed = completed.min(total);
        self.total_steps = Some(total);
        self.completed_steps = Some(completed);
        self.progress = Some(percent_of(completed, total));
    }

    /// Applies a status change at `now`, stamping `completed_at` on the
    /// first entry into `completed` only.
    pub fn set_status(&mut self, status: LoopStatus, now: Timestamp) {
        if status == LoopStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.status = status;
    }
}

/// A loop joined with progress computed from counters or live tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopWithProgress {
    #[serde(flatten)]
    pub record: Loop,
    /// Percentage complete in `[0, 100]`
    pub percent: u8,
    pub total_steps: u32,
    pub completed_steps: u32,
}
