//! Error types for the Loopz core library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all store, conversation and persistence
/// operations.
#[derive(Error, Debug)]
pub enum LoopzError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// The persistence collaborator could not complete a call
    #[error("Persistence error: {message}")]
    Persistence { message: String },
    /// The response generator failed or returned nothing usable
    #[error("Assistant error: {message}")]
    ResponseGeneration { message: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// A write was attempted without a signed-in user
    #[error("No user is signed in")]
    NotSignedIn,
    /// Accept was called while no suggestion was pending
    #[error("There is no pending loop suggestion")]
    NoPendingSuggestion,
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> LoopzError {
        LoopzError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> LoopzError {
        LoopzError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl LoopzError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a persistence error from any displayable cause.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a response generation error from any displayable cause.
    pub fn response(message: impl Into<String>) -> Self {
        Self::ResponseGeneration {
            message: message.into(),
        }
    }

    /// Whether the error was raised synchronously by input checks.
    ///
    /// Validation errors are returned to the caller but never recorded in a
    /// store's or the conversation's error state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::NotSignedIn | Self::NoPendingSuggestion
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| LoopzError::database(message).with_source(e))
    }
}

/// Maps a failed blocking-pool join into a configuration error.
pub(crate) fn join_error(e: tokio::task::JoinError) -> LoopzError {
    LoopzError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

/// Result type alias for Loopz operations
pub type Result<T> = std::result::Result<T, LoopzError>;
