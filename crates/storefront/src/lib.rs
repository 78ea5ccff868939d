//! Vivero Storefront - App core for the plant storefront.
//!
//! The mobile UI is a thin layer over this crate. Persistent state lives in
//! an external managed backend (authentication plus a document database
//! with real-time listeners); this crate is the view/coordination layer:
//!
//! - [`cart`] - The cart aggregate and its per-user durable persistence
//! - [`reconcile`] - Advisory drift correction against authoritative stock
//! - [`checkout`] - The atomic all-or-nothing stock decrement at purchase
//! - [`favorites`] - Server-authoritative favorites mirror
//! - [`catalog`] - Catalog reads and owner-mode inventory CRUD
//! - [`session`] - Identity and role tracking
//! - [`backend`] - The collaborator traits plus in-memory and file-backed
//!   implementations
//!
//! # Concurrency model
//!
//! Single consumer, event driven: the UI never runs two mutating operations
//! on the same aggregate concurrently (it disables re-entrant triggers such
//! as the checkout button while an attempt is in flight). Every backend
//! call is a suspension point. The only strong consistency guarantee in the
//! system is the checkout transaction; every other read path is a snapshot
//! subject to staleness, bounded by reconciliation and live subscriptions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod reconcile;
pub mod session;

pub use backend::{AuthService, Document, DocumentStore, KeyValueStore, StoreError, Transaction};
pub use cart::{Cart, CartItem, CartSession, QuantityAction};
pub use catalog::{ProductCatalog, ProductForm, addable_quantity};
pub use checkout::{CheckoutError, checkout};
pub use config::{ConfigError, StoreConfig};
pub use error::{AppError, Result};
pub use favorites::Favorites;
pub use reconcile::{Reconciliation, reconcile};
pub use session::{SessionState, SessionTracker, resolve_role};
