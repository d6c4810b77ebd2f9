//! Interactive chat session.
//!
//! A line-oriented shell over the [`Workspace`]: plain text goes to the
//! assistant, lines starting with `:` are commands. The session follows the
//! landing/dashboard/detail [`Navigator`] and re-renders the active layer on
//! every transition.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use loopz_core::{
    display::{LoopOverview, OperationStatus, TaskList, Transcript},
    models::{LoopFilter, LoopStatus, LoopSuggestion, TaskStatus},
    params::UpdateTask,
    Layer, LoopzError, Navigator, Session, StaticSession, Workspace,
};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::renderer::TerminalRenderer;

/// How often new assistant messages are picked up while a reply is paced.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const HELP: &str = "## Commands

- `:loops` show your loops
- `:open <id>` open a loop
- `:done <n>` toggle task number `n` of the open loop
- `:back` return to the previous view
- `:accept` create the suggested loop
- `:decline` dismiss the suggested loop
- `:signin` / `:signout` switch the session
- `:quit` leave

Anything else is sent to the assistant.
";

enum Flow {
    Continue,
    Quit,
}

pub struct ChatSession {
    workspace: Workspace,
    renderer: TerminalRenderer,
    session: Arc<StaticSession>,
    user_id: String,
    navigator: Navigator,
    shown_messages: usize,
    shown_suggestion: Option<LoopSuggestion>,
}

impl ChatSession {
    pub fn new(
        workspace: Workspace,
        renderer: TerminalRenderer,
        session: Arc<StaticSession>,
        user_id: String,
    ) -> Self {
        Self {
            workspace,
            renderer,
            session,
            user_id,
            navigator: Navigator::new(),
            shown_messages: 0,
            shown_suggestion: None,
        }
    }

    /// Reads commands from stdin until `:quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        if self.session.user_id().is_some() {
            self.navigator.go_to_dashboard();
        }
        let rendered = self.render_layer().await;
        self.navigator.finish_transition();
        rendered?;
        self.show_updates().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.renderer.prompt(self.navigator.current().as_str())?;
            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };
            if let Flow::Quit = self.handle_line(line.trim()).await? {
                break;
            }
        }
        info!("Chat session ended");
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let Some(command) = line.strip_prefix(':') else {
            self.send(line).await?;
            return Ok(Flow::Continue);
        };
        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (command, ""),
        };

        match name {
            "q" | "quit" | "exit" => return Ok(Flow::Quit),
            "h" | "help" => self.renderer.render(HELP)?,
            "loops" => {
                if self.require_user()? {
                    self.navigate(Navigator::go_to_dashboard).await?;
                }
            }
            "open" => self.open(argument).await?,
            "back" => self.navigate(Navigator::go_back).await?,
            "done" => self.toggle_task(argument).await?,
            "accept" => self.accept().await?,
            "decline" => {
                self.workspace.conversation().decline_suggestion().await;
                self.shown_suggestion = None;
                self.notice("Suggestion dismissed")?;
            }
            "signout" => {
                self.session.sign_out();
                info!("Signed out");
                self.navigate(Navigator::go_to_landing).await?;
            }
            "signin" => {
                self.session.sign_in(self.user_id.as_str());
                info!("Signed in as {}", self.user_id);
                self.workspace
                    .refresh()
                    .await
                    .context("Failed to load loops")?;
                self.navigate(Navigator::go_to_dashboard).await?;
            }
            other => self.failure(format!("Unknown command :{other}. Type :help for the list."))?,
        }
        Ok(Flow::Continue)
    }

    /// Sends a message and prints the assistant's messages as they are
    /// paced in.
    async fn send(&mut self, text: &str) -> Result<()> {
        let engine = Arc::clone(self.workspace.conversation());
        let content = text.to_string();
        let mut pending = tokio::spawn(async move { engine.send(&content).await });

        let joined = loop {
            tokio::select! {
                joined = &mut pending => break joined,
                () = tokio::time::sleep(POLL_INTERVAL) => self.show_updates().await?,
            }
        };
        self.show_updates().await?;

        match joined.context("Assistant task failed")? {
            Ok(()) => Ok(()),
            Err(LoopzError::NotSignedIn) => self.failure("Sign in with :signin first"),
            Err(e) => self.failure(e.to_string()),
        }
    }

    async fn accept(&mut self) -> Result<()> {
        match self.workspace.conversation().accept_suggestion().await {
            Ok(loop_id) => {
                debug!("Suggestion accepted as loop {loop_id}");
                self.shown_suggestion = None;
                self.show_updates().await?;
                if self.navigator.current() == Layer::Dashboard {
                    self.render_layer().await?;
                }
                Ok(())
            }
            Err(LoopzError::NoPendingSuggestion) => self.notice("There is no suggestion to accept"),
            Err(e) => {
                self.show_updates().await?;
                self.failure(e.to_string())
            }
        }
    }

    async fn open(&mut self, loop_id: &str) -> Result<()> {
        if !self.require_user()? {
            return Ok(());
        }
        if loop_id.is_empty() {
            return self.failure("Usage: :open <loop-id>");
        }
        if self.workspace.loops().get_by_id(loop_id).await.is_none() {
            return self.failure(format!("Loop with ID {loop_id} not found"));
        }
        self.navigate(|navigator| navigator.go_to_detail(loop_id))
            .await
    }

    async fn toggle_task(&mut self, argument: &str) -> Result<()> {
        let Some(loop_id) = self.navigator.active_loop_id().map(str::to_string) else {
            return self.failure("Open a loop first with :open <id>");
        };
        let Ok(number) = argument.parse::<usize>() else {
            return self.failure("Usage: :done <task number>");
        };
        let tasks = self.workspace.tasks().get_by_loop_id(&loop_id).await;
        let Some(task) = number.checked_sub(1).and_then(|index| tasks.get(index)) else {
            return self.failure(format!("Task number {number} does not exist"));
        };

        let status = if task.status == TaskStatus::Completed {
            TaskStatus::Pending
        } else {
            TaskStatus::Completed
        };
        if let Err(e) = self
            .workspace
            .tasks()
            .update(&UpdateTask::status(task.id.as_str(), status))
            .await
        {
            return self.failure(e.to_string());
        }
        self.render_layer().await
    }

    /// Runs a navigator transition and renders the new layer when it moved.
    async fn navigate<F>(&mut self, transition: F) -> Result<()>
    where
        F: FnOnce(&mut Navigator) -> bool,
    {
        if self.navigator.guarded(transition) {
            debug!("Navigated to {}", self.navigator.current());
            let rendered = self.render_layer().await;
            self.navigator.finish_transition();
            rendered?;
        }
        Ok(())
    }

    async fn render_layer(&self) -> Result<()> {
        match self.navigator.current() {
            Layer::Landing => self.renderer.render(
                "# Loopz\n\nTurn goals into loops of small tasks. Type `:signin` to continue.\n",
            ),
            Layer::Dashboard => {
                let overview = LoopOverview(
                    self.workspace
                        .loops_with_progress(&LoopFilter::with_status(LoopStatus::Active))
                        .await,
                );
                self.renderer.render(&format!("# Active Loops\n\n{overview}"))
            }
            Layer::Detail => {
                let loop_id = self.navigator.active_loop_id().unwrap_or_default();
                let Some(view) = self.workspace.loop_with_progress(loop_id).await else {
                    return self.failure(format!("Loop with ID {loop_id} not found"));
                };
                let tasks = TaskList(self.workspace.tasks().get_by_loop_id(loop_id).await);
                self.renderer
                    .render(&format!("{view}\n## Tasks\n\n{tasks}"))
            }
        }
    }

    /// Prints messages and the suggestion that appeared since the last call.
    async fn show_updates(&mut self) -> Result<()> {
        let engine = self.workspace.conversation();
        let messages = engine.messages().await;
        if let Some(fresh) = messages.get(self.shown_messages..) {
            if !fresh.is_empty() {
                self.renderer.render(&Transcript(fresh).to_string())?;
            }
        }
        self.shown_messages = messages.len();

        let suggestion = engine.suggestion().await;
        if suggestion.is_some() && suggestion != self.shown_suggestion {
            if let Some(pending) = &suggestion {
                self.renderer.render(&format!(
                    "{pending}\nType `:accept` to create it or `:decline` to dismiss it.\n"
                ))?;
            }
        }
        self.shown_suggestion = suggestion;
        Ok(())
    }

    fn require_user(&self) -> Result<bool> {
        if self.session.user_id().is_some() {
            return Ok(true);
        }
        self.failure("Sign in with :signin first")?;
        Ok(false)
    }

    fn notice(&self, message: impl Into<String>) -> Result<()> {
        self.renderer
            .render(&OperationStatus::notice(message).to_string())
    }

    fn failure(&self, message: impl Into<String>) -> Result<()> {
        self.renderer
            .render(&OperationStatus::failure(message).to_string())
    }
}
