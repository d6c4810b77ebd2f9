//! Response generation collaborator.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::{
    error::Result,
    models::{AssistantReply, ChatMessage},
};

/// Produces the assistant's reply to a user message.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Answers `input`, given the recent transcript ending with the message
    /// that carries `input`.
    async fn respond(&self, input: &str, history: &[ChatMessage]) -> Result<AssistantReply>;
}

const COACHING_REMARK: &str = "Have you considered breaking this down into smaller steps?";
const DEFAULT_TASKS: [&str; 3] = [
    "Research more about this topic",
    "Create a simple plan",
    "Consider different approaches",
];

/// A canned assistant with a fixed latency.
///
/// It reflects the input back, always adds the same coaching remark and
/// proposes a loop with a fixed probability.
#[derive(Debug, Clone)]
pub struct SimulatedResponder {
    latency: Duration,
    suggestion_probability: f64,
}

impl SimulatedResponder {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

    pub fn new() -> Self {
        Self {
            latency: Self::DEFAULT_LATENCY,
            suggestion_probability: 0.5,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Chance in `[0, 1]` that a reply proposes a loop. Out-of-range
    /// values are clamped.
    pub fn with_suggestion_probability(mut self, probability: f64) -> Self {
        self.suggestion_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn reply_to(input: &str, should_create_loop: bool) -> AssistantReply {
        let opening: Vec<&str> = input.split_whitespace().take(3).collect();
        AssistantReply {
            reflection: format!(
                "I understand you're thinking about \"{input}\". That's an interesting topic to explore."
            ),
            coaching: Some(COACHING_REMARK.to_string()),
            should_create_loop,
            suggested_title: Some(format!("Exploring {}...", opening.join(" "))),
            tasks: DEFAULT_TASKS.iter().map(|task| task.to_string()).collect(),
        }
    }
}

impl Default for SimulatedResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for SimulatedResponder {
    async fn respond(&self, input: &str, history: &[ChatMessage]) -> Result<AssistantReply> {
        debug!(
            "Simulating reply to {} chars with {} messages of context",
            input.len(),
            history.len()
        );
        tokio::time::sleep(self.latency).await;
        let should_create_loop = rand::random_bool(self.suggestion_probability);
        Ok(Self::reply_to(input.trim(), should_create_loop))
    }
}
