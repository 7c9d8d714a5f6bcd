//! Auth state for one storage scope. The store hydrates the user record from
//! storage once and mirrors every later change back to it. Transitions persist
//! first and only then update the in-memory state, so a failed write leaves
//! the previous state in place.

use crate::auth::{
    storage::{StorageError, UserStorage},
    types::AuthUser,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Who is signed in, as far as this scope knows.
///
/// `Unresolved` means storage has not been consulted yet. A user is present
/// only in `SignedIn`, so "no user" and "session known to exist" can never
/// be reported together.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Unresolved,
    SignedOut,
    SignedIn(AuthUser),
}

impl AuthState {
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::Unresolved | AuthState::SignedOut => None,
        }
    }

    /// `None` while unresolved, otherwise whether a session is known to exist.
    #[must_use]
    pub fn session_exists(&self) -> Option<bool> {
        match self {
            AuthState::Unresolved => None,
            AuthState::SignedOut => Some(false),
            AuthState::SignedIn(_) => Some(true),
        }
    }
}

pub struct AuthStore {
    storage: Arc<dyn UserStorage>,
    scope: String,
    state: AuthState,
    changes: watch::Sender<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(storage: Arc<dyn UserStorage>, scope: impl Into<String>) -> Self {
        let (changes, _) = watch::channel(AuthState::Unresolved);
        Self {
            storage,
            scope: scope.into(),
            state: AuthState::Unresolved,
            changes,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Hydrates the state from storage on first use; later calls are no-ops.
    ///
    /// A missing record resolves to `SignedOut`. Read failures are logged and
    /// also resolve to `SignedOut`, never back to `Unresolved`.
    pub fn initialize(&mut self) -> &AuthState {
        if self.state != AuthState::Unresolved {
            return &self.state;
        }

        let next = match self.storage.read(&self.scope) {
            Ok(Some(user)) => {
                debug!("Restored persisted user for scope {}", self.scope);
                AuthState::SignedIn(user)
            }
            Ok(None) => AuthState::SignedOut,
            Err(err) => {
                warn!(
                    "Failed to read persisted user for scope {}, treating as signed out: {err}",
                    self.scope
                );
                AuthState::SignedOut
            }
        };
        self.transition(next);

        &self.state
    }

    #[must_use]
    pub fn get(&self) -> Option<&AuthUser> {
        self.state.user()
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn session_exists(&self) -> Option<bool> {
        self.state.session_exists()
    }

    /// Adopts `user` (or clears it with `None`) and mirrors it to storage.
    ///
    /// # Errors
    /// Returns the storage error if the record could not be written or removed;
    /// the in-memory state is unchanged in that case.
    pub fn set(&mut self, user: Option<AuthUser>) -> Result<&AuthState, StorageError> {
        match &user {
            Some(user) => self.storage.write(&self.scope, user)?,
            None => self.storage.remove(&self.scope)?,
        }

        let next = match user {
            Some(user) => AuthState::SignedIn(user),
            None => AuthState::SignedOut,
        };
        self.transition(next);

        Ok(&self.state)
    }

    /// Receiver that observes every state transition of this store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.changes.subscribe()
    }

    fn transition(&mut self, next: AuthState) {
        self.state = next;
        self.changes.send_replace(self.state.clone());
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("scope", &self.scope)
            .field("session_exists", &self.state.session_exists())
            .finish_non_exhaustive()
    }
}
