//! Display implementations for domain models.
//!
//! All output is markdown so the CLI can render it with termimad or print
//! it as plain text.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    models::{ChatMessage, Loop, LoopStatus, LoopSuggestion, LoopWithProgress, Task, TaskStatus},
    navigation::Layer,
};

const BAR_WIDTH: usize = 20;

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fixed-width text progress bar, e.g. `[######--------------] 33%`.
///
/// # Examples
///
/// ```rust
/// use loopz_core::display::ProgressBar;
///
/// assert_eq!(ProgressBar(50).to_string(), "[##########----------] 50%");
/// assert_eq!(ProgressBar(0).to_string(), "[--------------------] 0%");
/// ```
pub struct ProgressBar(pub u8);

impl fmt::Display for ProgressBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = usize::from(self.0.min(100));
        let filled = (percent * BAR_WIDTH + 50) / 100;
        write!(
            f,
            "[{}{}] {percent}%",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled)
        )
    }
}

impl fmt::Display for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.title)?;
        writeln!(f)?;

        writeln!(f, "- ID: {}", self.id)?;
        writeln!(f, "- Status: {}", self.status)?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        if let Some(updated) = &self.updated_at {
            writeln!(f, "- Updated: {}", LocalDateTime(updated))?;
        }
        if let Some(completed) = &self.completed_at {
            writeln!(f, "- Completed: {}", LocalDateTime(completed))?;
        }

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        Ok(())
    }
}

impl fmt::Display for LoopWithProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record)?;
        writeln!(f)?;
        writeln!(
            f,
            "**Progress**: {} ({}/{} tasks)",
            ProgressBar(self.percent),
            self.completed_steps,
            self.total_steps
        )
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}. {} ({})",
            self.order + 1,
            self.title,
            self.status.with_icon()
        )?;
        writeln!(f, "   - ID: {}", self.id)?;
        if let Some(desc) = &self.description {
            writeln!(f, "   - {desc}")?;
        }
        if let Some(completed) = &self.completed_at {
            writeln!(f, "   - Completed: {}", LocalDateTime(completed))?;
        }
        Ok(())
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let speaker = if self.is_assistant() { "Assistant" } else { "You" };
        writeln!(f, "**{speaker}**: {}", self.content)
    }
}

impl fmt::Display for LoopSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Suggested loop: {}", self.title)?;
        writeln!(f)?;
        if self.tasks.is_empty() {
            writeln!(f, "No tasks suggested.")?;
        }
        for (index, task) in self.tasks.iter().enumerate() {
            writeln!(f, "{}. {task}", index + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(ProgressBar(100).to_string(), "[####################] 100%");
        assert_eq!(ProgressBar(33).to_string(), "[#######-------------] 33%");
        assert_eq!(ProgressBar(250).to_string(), "[####################] 100%");
    }

    #[test]
    fn test_task_display_is_one_based() {
        let task = Task {
            id: "t-1".to_string(),
            loop_id: "l-1".to_string(),
            user_id: "ada".to_string(),
            title: "Book flight".to_string(),
            description: Some("Window seat".to_string()),
            status: TaskStatus::Completed,
            order: 0,
            created_at: Timestamp::now(),
            updated_at: None,
            completed_at: None,
        };
        let output = task.to_string();
        assert!(output.starts_with("1. Book flight (✓ Completed)"));
        assert!(output.contains("Window seat"));
    }

    #[test]
    fn test_suggestion_lists_tasks() {
        let suggestion = LoopSuggestion {
            title: "Trip".to_string(),
            tasks: vec!["Book flight".to_string(), "Pack".to_string()],
        };
        let output = suggestion.to_string();
        assert!(output.contains("## Suggested loop: Trip"));
        assert!(output.contains("2. Pack"));
    }
}
