//! Session-bound cart with durable persistence.
//!
//! [`CartSession`] owns the [`Cart`] aggregate for the active user and
//! mirrors every mutation into the on-device key-value store under
//! `cart_<userId>`. The load-then-save ordering invariant lives here: no
//! persistence write is issued before the initial load for the active user
//! has completed, so a freshly initialised empty cart can never clobber a
//! previously saved one.
//!
//! Persistence is best-effort. A failed write is logged and swallowed; the
//! in-memory cart stays authoritative for the session.

use std::sync::Arc;

use vivero_core::{Product, ProductId, UserId};

use crate::backend::KeyValueStore;

use super::{Cart, CartItem, QuantityAction};

/// Storage key prefix for per-user cart snapshots.
pub const CART_KEY_PREFIX: &str = "cart_";

/// The current user's cart plus its persistence lifecycle.
pub struct CartSession {
    kv: Arc<dyn KeyValueStore>,
    cart: Cart,
    user: Option<UserId>,
    /// Set only once the initial load for `user` has completed. Guards every
    /// persistence write.
    loaded: bool,
}

impl CartSession {
    /// Create a session with no user and an empty cart.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            cart: Cart::new(),
            user: None,
            loaded: false,
        }
    }

    /// The underlying aggregate, for reads (`items`, `total`, `count`).
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The user this session is currently bound to.
    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    fn storage_key(user: &UserId) -> String {
        format!("{CART_KEY_PREFIX}{user}")
    }

    /// React to an auth-state change.
    ///
    /// Sign-out clears the in-memory cart only; the stored snapshot is left
    /// in place for the next sign-in. Sign-in restores the user's saved
    /// cart, after which mutations start persisting.
    pub async fn on_auth_changed(&mut self, user: Option<UserId>) {
        self.loaded = false;
        self.cart.clear();
        self.user = user;

        let Some(user) = self.user.clone() else {
            return;
        };

        match self.kv.get(&Self::storage_key(&user)).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => self.cart.replace(items),
                Err(error) => {
                    tracing::warn!(%user, %error, "stored cart is unreadable, starting empty");
                }
            },
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%user, %error, "failed to load stored cart");
            }
        }
        self.loaded = true;
    }

    /// Persist the current line items, if the initial load has completed.
    async fn persist(&self) {
        if !self.loaded {
            return;
        }
        let Some(user) = &self.user else {
            return;
        };

        let raw = match serde_json::to_string(self.cart.items()) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%user, %error, "failed to serialize cart");
                return;
            }
        };
        if let Err(error) = self.kv.set(&Self::storage_key(user), &raw).await {
            // Best effort: the in-memory cart remains authoritative.
            tracing::warn!(%user, %error, "failed to persist cart");
        }
    }

    /// Add one unit of a product. See [`Cart::add`].
    pub async fn add(&mut self, product: Product) {
        self.cart.add(product);
        self.persist().await;
    }

    /// Drop a line item. See [`Cart::remove`].
    pub async fn remove(&mut self, id: &ProductId) {
        self.cart.remove(id);
        self.persist().await;
    }

    /// Adjust a line quantity. See [`Cart::update_quantity`].
    pub async fn update_quantity(&mut self, id: &ProductId, action: QuantityAction) {
        self.cart.update_quantity(id, action);
        self.persist().await;
    }

    /// Empty the cart, e.g. after a successful checkout.
    pub async fn clear(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    /// Wholesale replacement from reconciliation. See [`Cart::replace`].
    pub async fn replace(&mut self, items: Vec<CartItem>) {
        self.cart.replace(items);
        self.persist().await;
    }
}
