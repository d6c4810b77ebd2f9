//! Session collaborator: who is signed in.

use std::sync::RwLock;

use crate::error::{LoopzError, Result};

/// Supplies the identifier of the authenticated user.
///
/// Every store write stamps its record with this identifier.
pub trait Session: Send + Sync {
    /// The signed-in user, or `None` when signed out.
    fn user_id(&self) -> Option<String>;

    /// The signed-in user, or [`LoopzError::NotSignedIn`].
    fn require_user(&self) -> Result<String> {
        self.user_id().ok_or(LoopzError::NotSignedIn)
    }
}

/// A session whose user is set explicitly, e.g. from a CLI flag.
#[derive(Debug, Default)]
pub struct StaticSession {
    user: RwLock<Option<String>>,
}

impl StaticSession {
    /// A session already signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user_id.into())),
        }
    }

    /// A session with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        if let Ok(mut user) = self.user.write() {
            *user = Some(user_id.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut user) = self.user.write() {
            *user = None;
        }
    }
}

impl Session for StaticSession {
    fn user_id(&self) -> Option<String> {
        self.user.read().ok().and_then(|user| user.clone())
    }
}
