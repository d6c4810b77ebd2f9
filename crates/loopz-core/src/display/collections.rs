//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use super::models::ProgressBar;
use crate::models::{ChatMessage, LoopWithProgress, Task};

/// Dashboard listing of loops with their progress.
///
/// # Examples
///
/// ```rust
/// use loopz_core::{
///     display::LoopOverview,
///     models::{Loop, LoopStatus, LoopWithProgress},
/// };
/// use jiff::Timestamp;
///
/// let record = Loop {
///     id: "1".to_string(),
///     user_id: "ada".to_string(),
///     title: "Learn Rust".to_string(),
///     description: None,
///     status: LoopStatus::Active,
///     progress: None,
///     total_steps: Some(5),
///     completed_steps: Some(3),
///     created_at: Timestamp::now(),
///     updated_at: None,
///     completed_at: None,
/// };
/// let overview = LoopOverview(vec![LoopWithProgress::new(record, None)]);
/// let output = overview.to_string();
/// assert!(output.contains("Learn Rust"));
/// assert!(output.contains("60%"));
/// ```
pub struct LoopOverview(pub Vec<LoopWithProgress>);

impl LoopOverview {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for LoopOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No loops found.");
        }
        for view in &self.0 {
            writeln!(f, "## {} (ID: {})", view.record.title, view.record.id)?;
            writeln!(f)?;
            writeln!(
                f,
                "- **Progress**: {} ({}/{})",
                ProgressBar(view.percent),
                view.completed_steps,
                view.total_steps
            )?;
            writeln!(f, "- **Status**: {}", view.record.status)?;
            if let Some(desc) = &view.record.description {
                writeln!(f, "- **Description**: {desc}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Ordered tasks of one loop.
pub struct TaskList(pub Vec<Task>);

impl TaskList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No tasks in this loop.");
        }
        for task in &self.0 {
            write!(f, "{task}")?;
        }
        Ok(())
    }
}

/// Chat transcript, oldest message first.
pub struct Transcript<'a>(pub &'a [ChatMessage]);

impl fmt::Display for Transcript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in self.0 {
            write!(f, "{message}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}
