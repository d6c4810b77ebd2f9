//! Timing and context settings for the conversation engine.

use std::time::Duration;

/// How the conversation engine paces replies and bounds context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationConfig {
    /// Delay between the reflection and the coaching remark
    pub coaching_delay: Duration,
    /// Delay between the reflection and the loop suggestion
    pub suggestion_delay: Duration,
    /// Number of earlier messages sent along with a new one
    pub history_window: usize,
}

impl ConversationConfig {
    pub const DEFAULT_COACHING_DELAY: Duration = Duration::from_millis(1000);
    pub const DEFAULT_SUGGESTION_DELAY: Duration = Duration::from_millis(1500);
    pub const DEFAULT_HISTORY_WINDOW: usize = 5;

    /// Settings with both delays removed, for scripted sessions.
    pub fn immediate() -> Self {
        Self {
            coaching_delay: Duration::ZERO,
            suggestion_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            coaching_delay: Self::DEFAULT_COACHING_DELAY,
            suggestion_delay: Self::DEFAULT_SUGGESTION_DELAY,
            history_window: Self::DEFAULT_HISTORY_WINDOW,
        }
    }
}
