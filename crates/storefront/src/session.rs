//! Session state: who is signed in and what they may do.
//!
//! The current user id and role are explicit state passed to the components
//! that need them, not an ambient global. [`SessionTracker`] subscribes to
//! the auth service, resolves the user's role from their `users/<uid>`
//! document on every sign-in, and republishes the combined state on a watch
//! channel for the cart, favorites, and owner-mode surfaces to consume.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use vivero_core::{UserId, UserRole};

use crate::backend::{AuthService, DocumentStore};

/// The resolved session: identity plus role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub user: Option<UserId>,
    pub role: UserRole,
}

impl SessionState {
    /// Whether the signed-in user may manage inventory.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        self.user.is_some() && self.role.is_owner()
    }
}

/// Look up a user's role from their profile document.
///
/// A missing profile or an unreadable role degrades to `Client` (with a
/// warning for the lookup failure); role resolution must never block
/// sign-in.
pub async fn resolve_role(
    store: &dyn DocumentStore,
    users_collection: &str,
    user: &UserId,
) -> UserRole {
    match store.get_document(users_collection, user.as_str()).await {
        Ok(Some(doc)) => doc
            .data
            .get("role")
            .and_then(serde_json::Value::as_str)
            .map_or(UserRole::Client, UserRole::parse),
        Ok(None) => UserRole::Client,
        Err(error) => {
            tracing::warn!(%user, %error, "role lookup failed, treating as client");
            UserRole::Client
        }
    }
}

/// Background task mirroring auth state (plus resolved role) onto a watch
/// channel. Dropping the tracker stops the task.
pub struct SessionTracker {
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionTracker {
    /// Start tracking the given auth service.
    pub fn spawn(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
    ) -> Self {
        let users_collection = users_collection.into();
        let (sender, state) = watch::channel(SessionState::default());
        let mut auth_states = auth.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let user = auth_states.borrow_and_update().clone();
                let role = match &user {
                    Some(user) => resolve_role(store.as_ref(), &users_collection, user).await,
                    None => UserRole::Client,
                };
                if sender.send(SessionState { user, role }).is_err() {
                    break;
                }
                if auth_states.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { state, task }
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// The most recently published session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
