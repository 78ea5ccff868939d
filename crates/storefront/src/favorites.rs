//! The favorites aggregate.
//!
//! A read-through mirror of the backend's per-user favorites collection
//! (`users/<uid>/favorites`, one marker document per favorited product).
//! The mirror performs no local-only mutation: a toggle issues the remote
//! write and the local set is only ever replaced by the next server-pushed
//! snapshot, so rapid toggles always converge to the last-committed server
//! state.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;

use vivero_core::{ProductId, UserId};

use crate::backend::{Document, DocumentStore, StoreResult};

/// Collection path for a user's favorite markers.
#[must_use]
pub fn favorites_collection(users_collection: &str, user: &UserId) -> String {
    format!("{users_collection}/{user}/favorites")
}

/// Server-authoritative favorites for the current user.
pub struct Favorites {
    store: Arc<dyn DocumentStore>,
    users_collection: String,
    user: Option<UserId>,
    mirror: HashSet<ProductId>,
    /// Live subscription for the signed-in user; dropping it unsubscribes.
    snapshots: Option<watch::Receiver<Vec<Document>>>,
}

impl Favorites {
    /// Create the aggregate with no signed-in user.
    pub fn new(store: Arc<dyn DocumentStore>, users_collection: impl Into<String>) -> Self {
        Self {
            store,
            users_collection: users_collection.into(),
            user: None,
            mirror: HashSet::new(),
            snapshots: None,
        }
    }

    /// Whether a product is favorited per the latest server snapshot.
    /// Always false when unauthenticated.
    #[must_use]
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.mirror.contains(id)
    }

    /// Whether favorites can be used at all (i.e. someone is signed in).
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.user.is_some()
    }

    /// React to an auth-state change.
    ///
    /// Sign-out clears the mirror immediately (no unsubscribe round-trip to
    /// wait for) and tears the subscription down. Sign-in establishes a
    /// fresh subscription scoped to the new user and applies its initial
    /// snapshot.
    pub fn on_auth_changed(&mut self, user: Option<UserId>) {
        self.mirror.clear();
        self.snapshots = None;
        self.user = user;

        if let Some(user) = &self.user {
            let collection = favorites_collection(&self.users_collection, user);
            let receiver = self.store.watch_collection(&collection);
            self.apply(&receiver.borrow());
            self.snapshots = Some(receiver);
        }
    }

    /// Toggle a product's favorite marker.
    ///
    /// No-op when unauthenticated (callers gate the control on session
    /// state; an unauthenticated toggle is not an error). Does not touch
    /// the local mirror; convergence happens via the subscription.
    ///
    /// # Errors
    ///
    /// Propagates the remote write failure; the mirror is unchanged.
    pub async fn toggle(&self, id: &ProductId) -> StoreResult<()> {
        let Some(user) = &self.user else {
            return Ok(());
        };
        let collection = favorites_collection(&self.users_collection, user);

        if self.mirror.contains(id) {
            self.store.delete_document(&collection, id.as_str()).await
        } else {
            let marker = json!({ "created_at": Utc::now().to_rfc3339() });
            self.store.set_document(&collection, id.as_str(), marker).await
        }
    }

    /// Wait for the next server-pushed snapshot and apply it.
    ///
    /// Returns `false` when there is no active subscription (signed out) or
    /// the backend closed the channel.
    pub async fn next_snapshot(&mut self) -> bool {
        let Some(receiver) = &mut self.snapshots else {
            return false;
        };
        if receiver.changed().await.is_err() {
            return false;
        }
        let snapshot: Vec<Document> = receiver.borrow_and_update().clone();
        self.apply(&snapshot);
        true
    }

    /// Apply the most recent snapshot without waiting, if one is pending.
    pub fn refresh(&mut self) {
        if let Some(receiver) = &mut self.snapshots {
            let snapshot: Vec<Document> = receiver.borrow_and_update().clone();
            self.apply(&snapshot);
        }
    }

    /// Replace the mirror wholesale from a server snapshot.
    fn apply(&mut self, snapshot: &[Document]) {
        self.mirror = snapshot
            .iter()
            .map(|doc| ProductId::new(doc.id.clone()))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use serde_json::json;

    const USERS: &str = "users";

    fn favorites_over(store: &MemoryStore) -> Favorites {
        Favorites::new(Arc::new(store.clone()), USERS)
    }

    #[tokio::test]
    async fn test_unauthenticated_toggle_is_silent_noop() {
        let store = MemoryStore::new();
        let favorites = favorites_over(&store);

        favorites.toggle(&ProductId::new("p1")).await.unwrap();

        assert!(!favorites.is_favorite(&ProductId::new("p1")));
        assert!(
            store
                .list_documents(&favorites_collection(USERS, &UserId::new("u1")))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_toggle_does_not_flip_mirror_optimistically() {
        let store = MemoryStore::new();
        let mut favorites = favorites_over(&store);
        favorites.on_auth_changed(Some(UserId::new("u1")));

        favorites.toggle(&ProductId::new("p1")).await.unwrap();
        // The write landed remotely but the mirror waits for the push.
        assert!(!favorites.is_favorite(&ProductId::new("p1")));

        assert!(favorites.next_snapshot().await);
        assert!(favorites.is_favorite(&ProductId::new("p1")));
    }

    #[tokio::test]
    async fn test_toggle_twice_converges_to_server_state() {
        let store = MemoryStore::new();
        let mut favorites = favorites_over(&store);
        favorites.on_auth_changed(Some(UserId::new("u1")));

        favorites.toggle(&ProductId::new("p1")).await.unwrap();
        favorites.refresh();
        favorites.toggle(&ProductId::new("p1")).await.unwrap();
        favorites.refresh();

        assert!(!favorites.is_favorite(&ProductId::new("p1")));
        let collection = favorites_collection(USERS, &UserId::new("u1"));
        assert!(store.list_documents(&collection).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mirror_matches_server_regardless_of_local_expectation() {
        let store = MemoryStore::new();
        let collection = favorites_collection(USERS, &UserId::new("u1"));
        let mut favorites = favorites_over(&store);
        favorites.on_auth_changed(Some(UserId::new("u1")));

        // Another device favorites two products behind our back.
        store
            .set_document(&collection, "p7", json!({}))
            .await
            .unwrap();
        store
            .set_document(&collection, "p8", json!({}))
            .await
            .unwrap();

        favorites.refresh();
        assert!(favorites.is_favorite(&ProductId::new("p7")));
        assert!(favorites.is_favorite(&ProductId::new("p8")));
    }

    #[tokio::test]
    async fn test_sign_out_clears_immediately() {
        let store = MemoryStore::new();
        let mut favorites = favorites_over(&store);
        favorites.on_auth_changed(Some(UserId::new("u1")));
        favorites.toggle(&ProductId::new("p1")).await.unwrap();
        favorites.refresh();
        assert!(favorites.is_favorite(&ProductId::new("p1")));

        favorites.on_auth_changed(None);
        assert!(!favorites.is_favorite(&ProductId::new("p1")));
        assert!(!favorites.enabled());
    }

    #[tokio::test]
    async fn test_sign_in_scopes_to_new_user() {
        let store = MemoryStore::new();
        store
            .set_document(&favorites_collection(USERS, &UserId::new("u2")), "p9", json!({}))
            .await
            .unwrap();

        let mut favorites = favorites_over(&store);
        favorites.on_auth_changed(Some(UserId::new("u1")));
        assert!(!favorites.is_favorite(&ProductId::new("p9")));

        favorites.on_auth_changed(Some(UserId::new("u2")));
        assert!(favorites.is_favorite(&ProductId::new("p9")));
    }
}
