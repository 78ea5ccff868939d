//! Favorites lifecycle against live auth state.

use std::sync::Arc;

use serde_json::json;

use vivero_core::{ProductId, UserId};
use vivero_integration_tests::{USERS, backend_with_stock};
use vivero_storefront::Favorites;
use vivero_storefront::backend::{AuthService, DocumentStore};
use vivero_storefront::favorites::favorites_collection;

#[tokio::test]
async fn test_favorites_follow_auth_lifecycle() {
    let backend = backend_with_stock(&[("a", 5)]).await;
    let mut favorites = Favorites::new(
        Arc::clone(&backend.store) as Arc<dyn DocumentStore>,
        USERS,
    );

    // Nobody signed in: toggles are silent no-ops.
    favorites.toggle(&ProductId::new("a")).await.expect("noop");
    assert!(!favorites.enabled());

    backend.auth.sign_in(UserId::new("u1"));
    favorites.on_auth_changed(backend.auth.current_user());
    assert!(favorites.enabled());

    favorites.toggle(&ProductId::new("a")).await.expect("toggle");
    assert!(favorites.next_snapshot().await);
    assert!(favorites.is_favorite(&ProductId::new("a")));

    // Sign-out clears immediately, before any backend round-trip.
    backend.auth.sign_out().await.expect("sign out");
    favorites.on_auth_changed(backend.auth.current_user());
    assert!(!favorites.is_favorite(&ProductId::new("a")));

    // The marker itself is still on the server for the next sign-in.
    backend.auth.sign_in(UserId::new("u1"));
    favorites.on_auth_changed(backend.auth.current_user());
    assert!(favorites.is_favorite(&ProductId::new("a")));
}

#[tokio::test]
async fn test_mirror_converges_to_server_after_racing_toggles() {
    let backend = backend_with_stock(&[("a", 5)]).await;
    let mut favorites = Favorites::new(
        Arc::clone(&backend.store) as Arc<dyn DocumentStore>,
        USERS,
    );
    favorites.on_auth_changed(Some(UserId::new("u1")));

    // Two quick toggles before any snapshot lands. The mirror still shows
    // the pre-toggle state both times, so both writes are upserts and the
    // second simply overwrites the first marker.
    favorites.toggle(&ProductId::new("a")).await.expect("first");
    favorites.toggle(&ProductId::new("a")).await.expect("second");

    favorites.refresh();
    // Whatever the local expectation was, the mirror now equals the server.
    let server = backend
        .store
        .list_documents(&favorites_collection(USERS, &UserId::new("u1")))
        .await
        .expect("list");
    assert_eq!(server.len(), 1);
    assert!(favorites.is_favorite(&ProductId::new("a")));
}

#[tokio::test]
async fn test_remote_changes_push_into_mirror() {
    let backend = backend_with_stock(&[]).await;
    let mut favorites = Favorites::new(
        Arc::clone(&backend.store) as Arc<dyn DocumentStore>,
        USERS,
    );
    favorites.on_auth_changed(Some(UserId::new("u1")));

    let collection = favorites_collection(USERS, &UserId::new("u1"));
    backend
        .store
        .set_document(&collection, "p1", json!({}))
        .await
        .expect("remote favorite");

    assert!(favorites.next_snapshot().await);
    assert!(favorites.is_favorite(&ProductId::new("p1")));

    backend
        .store
        .delete_document(&collection, "p1")
        .await
        .expect("remote unfavorite");
    assert!(favorites.next_snapshot().await);
    assert!(!favorites.is_favorite(&ProductId::new("p1")));
}
