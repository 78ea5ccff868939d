//! Backend collaborator traits.
//!
//! The app core never talks to the managed backend directly; it goes through
//! three narrow traits: [`AuthService`] for identity, [`DocumentStore`] for
//! product/favorite records (including the atomic transaction primitive used
//! by checkout), and [`KeyValueStore`] for durable on-device cart snapshots.
//!
//! Live subscriptions are modelled as `tokio::sync::watch` channels: the
//! backend pushes the full current result set on every change, last write
//! wins, and dropping the receiver is the unsubscribe.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use vivero_core::UserId;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::{MemoryAuth, MemoryBackend, MemoryKv, MemoryStore};

/// Errors surfaced by the backend collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network unreachable or backend timeout. Retryable by the user, never
    /// retried automatically by the core.
    #[error("backend unreachable: {0}")]
    Transport(String),

    /// The transaction could not commit because a concurrent writer got
    /// there first and the backend exhausted its retries.
    #[error("transaction aborted by a conflicting write")]
    Conflict,

    /// A document failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record was structurally unusable.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A raw backend document: an opaque id plus loosely typed fields.
///
/// Typed views (e.g. `Product`) are produced at the consumer boundary via
/// parse-with-defaults, never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Create a document from an id and its fields.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Authentication collaborator. Identity is an opaque string id.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;

    /// Subscribe to auth-state changes. The receiver always holds the most
    /// recent identity; dropping it tears the subscription down.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;

    /// Sign the current user out.
    async fn sign_out(&self) -> StoreResult<()>;
}

/// Document database collaborator.
///
/// Collections are addressed by slash-separated paths
/// (e.g. `products`, `users/<uid>/favorites`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Fetch every document in a collection.
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Create or fully overwrite a document at a known id.
    async fn set_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    /// Create a document with a generated id; returns the id.
    async fn add_document(&self, collection: &str, data: Value) -> StoreResult<String>;

    /// Merge fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Live subscription to a whole collection. Pushes the full current
    /// result set on every change.
    fn watch_collection(&self, collection: &str) -> watch::Receiver<Vec<Document>>;

    /// Live subscription to a single document. Pushes `None` when the
    /// document is deleted.
    fn watch_document(&self, collection: &str, id: &str) -> watch::Receiver<Option<Document>>;

    /// Begin an atomic read-then-write transaction.
    ///
    /// Reads observe a serializable isolation snapshot; writes are buffered
    /// and applied all-or-nothing on [`Transaction::commit`]. Dropping the
    /// transaction without committing discards every buffered write.
    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>>;
}

/// An in-flight atomic transaction.
///
/// The backend guarantees that if underlying data changed between the reads
/// and the commit, the commit fails with [`StoreError::Conflict`] and no
/// write is applied.
#[async_trait]
pub trait Transaction: Send {
    /// Read a document within the transaction's isolation snapshot.
    async fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Buffer a field merge. Nothing is visible to other readers until
    /// `commit` succeeds.
    fn update(&mut self, collection: &str, id: &str, data: Value);

    /// Atomically apply every buffered write.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Durable on-device key-value storage for the cart snapshot.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a stored string, `None` if the key was never written.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a string under a key, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}
