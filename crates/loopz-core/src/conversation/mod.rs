//! Chat conversation with the assistant.
//!
//! The [`ConversationEngine`] keeps the transcript of one session, sends
//! user messages to a [`ResponseGenerator`], paces the assistant's
//! follow-up messages and turns an accepted [`LoopSuggestion`] into a new
//! loop with tasks.
//!
//! ```text
//!            send()                      reply / failure
//!   ┌──────┐ ─────────▶ ┌─────────┐ ───────────────────▶ ┌──────┐
//!   │ Idle │            │ Sending │                      │ Idle │
//!   └──────┘            └─────────┘                      └──────┘
//! ```
//!
//! A send appends, in this order: the user's message, the reflection, the
//! coaching remark (after `coaching_delay`), and finally publishes the
//! suggestion (after `suggestion_delay`). Both delays are measured from the
//! moment the reply arrived.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use log::{debug, info, warn};
use tokio::{sync::RwLock, time::Instant};

use crate::{
    error::{LoopzError, Result},
    models::{AssistantReply, ChatMessage, LoopSuggestion},
    params::{CreateLoop, CreateTask},
    session::Session,
    store::{LoopStore, TaskStore},
};

mod config;
mod responder;

pub use config::ConversationConfig;
pub use responder::{ResponseGenerator, SimulatedResponder};

/// Opening line of a conversation seeded with [`ConversationEngine::with_greeting`].
pub const GREETING: &str = "Hi there! What's on your mind today?";
/// Assistant message appended when response generation fails.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble processing that right now. Can we try a different approach?";
/// Assistant message appended when accepting a suggestion fails.
pub const ACCEPT_FAILED_REPLY: &str = "I couldn't create the loop right now. Let's try again later.";

/// Where the engine is in its send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
}

/// Work already done for the pending suggestion, so a retried accept
/// resumes instead of creating duplicates.
#[derive(Debug, Clone)]
struct AcceptProgress {
    suggestion: LoopSuggestion,
    loop_id: String,
    created_tasks: usize,
}

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<ChatMessage>,
    suggestion: Option<LoopSuggestion>,
    error: Option<String>,
    accept_progress: Option<AcceptProgress>,
}

/// Resets a flag or counter when the guarded operation ends.
enum ActivityGuard<'a> {
    Flag(&'a AtomicBool),
    Counter(&'a AtomicUsize),
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        match self {
            ActivityGuard::Flag(flag) => flag.store(false, Ordering::SeqCst),
            ActivityGuard::Counter(counter) => {
                counter.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

/// Transcript, pending suggestion and send cycle of one chat session.
pub struct ConversationEngine {
    responder: Arc<dyn ResponseGenerator>,
    loops: Arc<LoopStore>,
    tasks: Arc<TaskStore>,
    session: Arc<dyn Session>,
    config: ConversationConfig,
    state: RwLock<ConversationState>,
    sending: AtomicBool,
    in_flight: AtomicUsize,
}

impl ConversationEngine {
    pub fn new(
        responder: Arc<dyn ResponseGenerator>,
        loops: Arc<LoopStore>,
        tasks: Arc<TaskStore>,
        session: Arc<dyn Session>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            responder,
            loops,
            tasks,
            session,
            config,
            state: RwLock::new(ConversationState::default()),
            sending: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Seeds the transcript with the assistant's greeting.
    pub fn with_greeting(mut self) -> Self {
        self.state
            .get_mut()
            .messages
            .push(ChatMessage::assistant(GREETING));
        self
    }

    /// Sends a user message and appends the assistant's reply.
    ///
    /// Blank content and sends issued while another send is in flight are
    /// ignored. When response generation fails a fallback message is
    /// appended, the error is recorded and returned, and the pending
    /// suggestion is left as it was.
    pub async fn send(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }
        self.session.require_user()?;
        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Send ignored: a reply is still in progress");
            return Ok(());
        }
        let _sending = ActivityGuard::Flag(&self.sending);
        let _busy = self.enter_busy();

        let history = {
            let mut state = self.state.write().await;
            state.error = None;
            let window = self.config.history_window;
            let start = state.messages.len().saturating_sub(window);
            let mut history = state.messages[start..].to_vec();
            let message = ChatMessage::user(content);
            history.push(message.clone());
            state.messages.push(message);
            history
        };

        let reply = match self.responder.respond(content, &history).await {
            Ok(reply) if !reply.reflection.trim().is_empty() => reply,
            Ok(_) => {
                let error = LoopzError::response("The assistant returned an empty reply");
                self.record_failure(&error, FALLBACK_REPLY).await;
                return Err(error);
            }
            Err(error) => {
                self.record_failure(&error, FALLBACK_REPLY).await;
                return Err(error);
            }
        };

        self.deliver(reply).await;
        Ok(())
    }

    /// Appends the reply's messages and publishes its suggestion in order.
    async fn deliver(&self, reply: AssistantReply) {
        let arrived = Instant::now();
        self.push_message(ChatMessage::assistant(reply.reflection.trim()))
            .await;

        if let Some(coaching) = reply.coaching.as_deref().map(str::trim) {
            if !coaching.is_empty() {
                tokio::time::sleep_until(arrived + self.config.coaching_delay).await;
                self.push_message(ChatMessage::assistant(coaching)).await;
            }
        }

        if let Some(suggestion) = reply.suggestion() {
            tokio::time::sleep_until(arrived + self.config.suggestion_delay).await;
            debug!("Assistant suggests loop \"{}\"", suggestion.title);
            let mut state = self.state.write().await;
            state.suggestion = Some(suggestion);
            state.accept_progress = None;
        }
    }

    /// Creates the pending suggestion as a loop with its tasks and returns
    /// the new loop's id.
    ///
    /// A failed accept keeps the suggestion; calling again resumes with
    /// the first loop or task that was not created yet.
    ///
    /// # Errors
    ///
    /// Returns `LoopzError::NoPendingSuggestion` when nothing is pending,
    /// `LoopzError::NotSignedIn` without a session user, and the store
    /// error when a write fails.
    pub async fn accept_suggestion(&self) -> Result<String> {
        let (suggestion, progress) = {
            let state = self.state.read().await;
            let suggestion = state
                .suggestion
                .clone()
                .ok_or(LoopzError::NoPendingSuggestion)?;
            let progress = state
                .accept_progress
                .clone()
                .filter(|progress| progress.suggestion == suggestion);
            (suggestion, progress)
        };
        self.session.require_user()?;
        let _busy = self.enter_busy();
        self.state.write().await.error = None;

        let (loop_id, mut created_tasks) = match progress {
            Some(progress) => {
                debug!(
                    "Resuming accept of \"{}\" after {} tasks",
                    suggestion.title, progress.created_tasks
                );
                (progress.loop_id, progress.created_tasks)
            }
            None => match self
                .loops
                .create(&CreateLoop::new(suggestion.title.as_str()))
                .await
            {
                Ok(loop_id) => (loop_id, 0),
                Err(error) => {
                    self.record_failure(&error, ACCEPT_FAILED_REPLY).await;
                    return Err(error);
                }
            },
        };

        for title in suggestion.tasks.iter().skip(created_tasks) {
            if let Err(error) = self
                .tasks
                .create(&CreateTask::new(loop_id.as_str(), title.as_str()))
                .await
            {
                let mut state = self.state.write().await;
                state.accept_progress = Some(AcceptProgress {
                    suggestion: suggestion.clone(),
                    loop_id: loop_id.clone(),
                    created_tasks,
                });
                drop(state);
                self.record_failure(&error, ACCEPT_FAILED_REPLY).await;
                return Err(error);
            }
            created_tasks += 1;
        }

        info!(
            "Created loop {loop_id} from suggestion \"{}\" with {created_tasks} tasks",
            suggestion.title
        );
        let mut state = self.state.write().await;
        state.suggestion = None;
        state.accept_progress = None;
        state.messages.push(ChatMessage::assistant(format!(
            "Great! I've created a loop called \"{}\" with {} tasks.",
            suggestion.title,
            suggestion.tasks.len()
        )));
        Ok(loop_id)
    }

    /// Drops the pending suggestion, if any.
    pub async fn decline_suggestion(&self) {
        let mut state = self.state.write().await;
        if let Some(suggestion) = state.suggestion.take() {
            debug!("Declined suggestion \"{}\"", suggestion.title);
        }
        state.accept_progress = None;
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn suggestion(&self) -> Option<LoopSuggestion> {
        self.state.read().await.suggestion.clone()
    }

    /// Message of the last failure, if any.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Whether a send or accept is in flight.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn phase(&self) -> Phase {
        if self.sending.load(Ordering::SeqCst) {
            Phase::Sending
        } else {
            Phase::Idle
        }
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    fn enter_busy(&self) -> ActivityGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ActivityGuard::Counter(&self.in_flight)
    }

    async fn push_message(&self, message: ChatMessage) {
        self.state.write().await.messages.push(message);
    }

    async fn record_failure(&self, error: &LoopzError, reply: &str) {
        warn!("Conversation failure: {error}");
        let mut state = self.state.write().await;
        state.messages.push(ChatMessage::assistant(reply));
        state.error = Some(error.to_string());
    }
}
