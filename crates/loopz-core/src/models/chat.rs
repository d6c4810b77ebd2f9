//! Conversation transcript types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

/// One turn of the transcript. Messages are appended and never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub origin: Origin,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// A message typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Origin::User)
    }

    /// A message produced by the assistant.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, Origin::Assistant)
    }

    fn new(content: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            origin,
            timestamp: Timestamp::now(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.origin == Origin::Assistant
    }
}

/// An assistant-proposed loop awaiting accept or decline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoopSuggestion {
    pub title: String,
    pub tasks: Vec<String>,
}

/// Structured result of one response-generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantReply {
    /// Primary answer, always shown
    pub reflection: String,
    /// Optional follow-up remark, shown after a short delay
    pub coaching: Option<String>,
    /// Whether the assistant proposes creating a loop
    pub should_create_loop: bool,
    pub suggested_title: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl AssistantReply {
    /// The loop suggestion carried by this reply, if it asks for one and
    /// names a title. Blank task titles are dropped.
    pub fn suggestion(&self) -> Option<LoopSuggestion> {
        if !self.should_create_loop {
            return None;
        }
        let title = self.suggested_title.as_deref()?.trim();
        if title.is_empty() {
            return None;
        }
        Some(LoopSuggestion {
            title: title.to_string(),
            tasks: self
                .tasks
                .iter()
                .map(|task| task.trim())
                .filter(|task| !task.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}
