//! Parameter structures for Loopz operations
//!
//! These structures are shared by every interface (CLI, chat session, tests)
//! and carry no framework-specific derives. Interface layers define their own
//! argument types and convert into these with `From`.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │     Stores      │
//! │  (clap derives) │───▶│ (serde only)    │───▶│ (LoopStore etc) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{LoopStatus, TaskStatus};

/// Parameters for creating a new loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLoop {
    /// Title of the loop (required, non-empty)
    pub title: String,
    /// Optional detailed description of the loop
    pub description: Option<String>,
}

impl CreateLoop {
    /// A loop with a title and no description.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }
}

/// Parameters for editing a loop. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLoop {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<LoopStatus>,
}

impl UpdateLoop {
    /// An update that changes nothing yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Parameters for adding a task at the end of a loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    /// ID of the loop to add the task to
    pub loop_id: String,
    /// Title of the task (required, non-empty)
    pub title: String,
    /// Optional detailed description of the task
    pub description: Option<String>,
}

impl CreateTask {
    pub fn new(loop_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            loop_id: loop_id.into(),
            title: title.into(),
            description: None,
        }
    }
}

/// Parameters for editing a task. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// An update that only changes the status.
    pub fn status(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Parameters for reordering the tasks of one loop.
///
/// `task_ids` should list every task of the loop in the desired order.
/// Tasks left out are moved after the listed ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderTasks {
    pub loop_id: String,
    pub task_ids: Vec<String>,
}
