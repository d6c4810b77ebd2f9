//! Builder for creating and configuring Workspace instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use super::Workspace;
use crate::{
    conversation::{ConversationConfig, ConversationEngine, ResponseGenerator, SimulatedResponder},
    error::{LoopzError, Result},
    persistence::{MemoryPersistence, Persistence, SqlitePersistence},
    session::{Session, StaticSession},
    store::{LoopStore, TaskStore},
};

/// Builder for creating and configuring Workspace instances.
#[derive(Clone, Default)]
pub struct WorkspaceBuilder {
    database_path: Option<PathBuf>,
    in_memory: bool,
    user_id: Option<String>,
    session: Option<Arc<dyn Session>>,
    persistence: Option<Arc<dyn Persistence>>,
    responder: Option<Arc<dyn ResponseGenerator>>,
    conversation: ConversationConfig,
    greeting: bool,
}

impl WorkspaceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/loopz/loopz.db` or `~/.local/share/loopz/loopz.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Keeps every record in process memory instead of a database file.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Signs the workspace in as `user_id`.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Uses a custom session collaborator; takes precedence over
    /// [`with_user`](Self::with_user).
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Uses a custom persistence collaborator; takes precedence over the
    /// database path and in-memory settings.
    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Uses a custom response generator instead of the simulated one.
    pub fn with_responder(mut self, responder: Arc<dyn ResponseGenerator>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_conversation_config(mut self, config: ConversationConfig) -> Self {
        self.conversation = config;
        self
    }

    /// Opens the conversation with the assistant's greeting.
    pub fn with_greeting(mut self, greeting: bool) -> Self {
        self.greeting = greeting;
        self
    }

    /// Builds the configured workspace.
    ///
    /// # Errors
    ///
    /// Returns `LoopzError::XdgDirectory` if no default database location
    /// can be determined, `LoopzError::FileSystem` if the database
    /// directory cannot be created and `LoopzError::Database` if database
    /// initialization fails.
    pub async fn build(self) -> Result<Workspace> {
        let persistence: Arc<dyn Persistence> = match self.persistence {
            Some(persistence) => persistence,
            None if self.in_memory => {
                debug!("Using in-memory persistence");
                Arc::new(MemoryPersistence::new())
            }
            None => {
                let db_path = match self.database_path {
                    Some(path) => path,
                    None => Self::default_database_path()?,
                };
                Arc::new(SqlitePersistence::open(&db_path).await?)
            }
        };

        let session: Arc<dyn Session> = match (self.session, self.user_id) {
            (Some(session), _) => session,
            (None, Some(user_id)) => Arc::new(StaticSession::signed_in(user_id)),
            (None, None) => Arc::new(StaticSession::signed_out()),
        };

        let responder = self
            .responder
            .unwrap_or_else(|| Arc::new(SimulatedResponder::new()));

        let loops = Arc::new(LoopStore::new(persistence.clone(), session.clone()));
        let tasks = Arc::new(
            TaskStore::new(persistence.clone(), session.clone()).with_loop_store(loops.clone()),
        );
        let mut engine = ConversationEngine::new(
            responder,
            loops.clone(),
            tasks.clone(),
            session.clone(),
            self.conversation,
        );
        if self.greeting {
            engine = engine.with_greeting();
        }

        Ok(Workspace::new(
            persistence,
            session,
            loops,
            tasks,
            Arc::new(engine),
        ))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    pub fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("loopz")
            .place_data_file("loopz.db")
            .map_err(|e| LoopzError::XdgDirectory(e.to_string()))
    }
}
