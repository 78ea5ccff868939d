//! In-memory backend implementations.
//!
//! [`MemoryBackend`] bundles an auth service, a document store, and a
//! key-value store with the same observable semantics as the managed
//! backend: live watch channels, last-write-wins snapshots, and a
//! serializable transaction primitive. It doubles as the test harness and
//! the offline development backend, with fault injection toggles for the
//! transport and conflict paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};

use vivero_core::UserId;

use super::{AuthService, Document, DocumentStore, KeyValueStore, StoreError, StoreResult,
            Transaction};

// =============================================================================
// Auth
// =============================================================================

/// In-memory auth service.
///
/// Tests and the CLI drive sign-in directly; the app core only ever consumes
/// the `AuthService` trait surface.
pub struct MemoryAuth {
    state: watch::Sender<Option<UserId>>,
}

impl MemoryAuth {
    /// Create an auth service with no signed-in user.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Sign a user in, notifying every subscriber.
    pub fn sign_in(&self, user: UserId) {
        self.state.send_replace(Some(user));
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    fn current_user(&self) -> Option<UserId> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.state.subscribe()
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.state.send_replace(None);
        Ok(())
    }
}

// =============================================================================
// Document store
// =============================================================================

#[derive(Default)]
struct StoreState {
    /// collection path -> (document id -> fields)
    collections: HashMap<String, BTreeMap<String, Value>>,
    next_id: u64,
}

#[derive(Default)]
struct WatcherRegistry {
    collections: HashMap<String, watch::Sender<Vec<Document>>>,
    documents: HashMap<(String, String), watch::Sender<Option<Document>>>,
}

#[derive(Default)]
struct Faults {
    offline: bool,
    fail_next_commit: bool,
}

/// In-memory document store with watch channels and serializable
/// transactions.
#[derive(Clone)]
pub struct MemoryStore {
    /// Serializes transactions (and plain writes against them). A
    /// transaction holds this for its whole lifetime, which is what makes
    /// two racing checkouts observe each other's committed stock.
    tx_lock: Arc<Mutex<()>>,
    state: Arc<StdMutex<StoreState>>,
    watchers: Arc<StdMutex<WatcherRegistry>>,
    faults: Arc<StdMutex<Faults>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx_lock: Arc::new(Mutex::new(())),
            state: Arc::new(StdMutex::new(StoreState::default())),
            watchers: Arc::new(StdMutex::new(WatcherRegistry::default())),
            faults: Arc::new(StdMutex::new(Faults::default())),
        }
    }

    /// Simulate the network being unreachable. Every subsequent call fails
    /// with [`StoreError::Transport`] until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.faults.lock().unwrap_or_else(std::sync::PoisonError::into_inner).offline = offline;
    }

    /// Make the next transaction commit fail with [`StoreError::Conflict`].
    pub fn fail_next_commit(&self) {
        self.faults
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .fail_next_commit = true;
    }

    /// Snapshot every collection, for persistence by a wrapping store.
    #[must_use]
    pub fn export_collections(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        let state = self.lock_state();
        state
            .collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.clone()))
            .collect()
    }

    /// Replace the whole data set, e.g. when loading from disk.
    pub fn import_collections(&self, collections: BTreeMap<String, BTreeMap<String, Value>>) {
        let notify: Vec<String> = {
            let mut state = self.lock_state();
            state.collections = collections.into_iter().collect();
            state.collections.keys().cloned().collect()
        };
        for collection in notify {
            self.notify(&collection);
        }
    }

    fn check_online(&self) -> StoreResult<()> {
        let faults = self
            .faults
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if faults.offline {
            return Err(StoreError::Transport("simulated offline".to_owned()));
        }
        Ok(())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn snapshot_collection(state: &StoreState, collection: &str) -> Vec<Document> {
        state
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&self, collection: &str) {
        let state = self.lock_state();
        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(sender) = watchers.collections.get(collection) {
            sender.send_replace(Self::snapshot_collection(&state, collection));
        }

        watchers
            .documents
            .retain(|_, sender| sender.receiver_count() > 0);
        for ((coll, id), sender) in &watchers.documents {
            if coll == collection {
                let current = state
                    .collections
                    .get(coll)
                    .and_then(|docs| docs.get(id))
                    .map(|data| Document::new(id.clone(), data.clone()));
                sender.send_replace(current);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow field merge, matching the backend's update semantics.
fn merge_fields(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let state = self.lock_state();
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.check_online()?;
        let state = self.lock_state();
        Ok(Self::snapshot_collection(&state, collection))
    }

    async fn set_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.check_online()?;
        let _serialized = self.tx_lock.lock().await;
        {
            let mut state = self.lock_state();
            state
                .collections
                .entry(collection.to_owned())
                .or_default()
                .insert(id.to_owned(), data);
        }
        self.notify(collection);
        Ok(())
    }

    async fn add_document(&self, collection: &str, data: Value) -> StoreResult<String> {
        self.check_online()?;
        let _serialized = self.tx_lock.lock().await;
        let id = {
            let mut state = self.lock_state();
            state.next_id += 1;
            let id = format!("doc-{:04}", state.next_id);
            state
                .collections
                .entry(collection.to_owned())
                .or_default()
                .insert(id.clone(), data);
            id
        };
        self.notify(collection);
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.check_online()?;
        let _serialized = self.tx_lock.lock().await;
        {
            let mut state = self.lock_state();
            let existing = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| {
                    StoreError::InvalidDocument(format!("no document {collection}/{id}"))
                })?;
            merge_fields(existing, &data);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.check_online()?;
        let _serialized = self.tx_lock.lock().await;
        {
            let mut state = self.lock_state();
            if let Some(docs) = state.collections.get_mut(collection) {
                docs.remove(id);
            }
        }
        self.notify(collection);
        Ok(())
    }

    fn watch_collection(&self, collection: &str) -> watch::Receiver<Vec<Document>> {
        let state = self.lock_state();
        let snapshot = Self::snapshot_collection(&state, collection);
        drop(state);

        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sender = watchers
            .collections
            .entry(collection.to_owned())
            .or_insert_with(|| watch::channel(snapshot.clone()).0);
        sender.send_replace(snapshot);
        sender.subscribe()
    }

    fn watch_document(&self, collection: &str, id: &str) -> watch::Receiver<Option<Document>> {
        let state = self.lock_state();
        let current = state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone()));
        drop(state);

        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sender = watchers
            .documents
            .entry((collection.to_owned(), id.to_owned()))
            .or_insert_with(|| watch::channel(current.clone()).0);
        sender.send_replace(current);
        sender.subscribe()
    }

    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>> {
        self.check_online()?;
        let guard = Arc::clone(&self.tx_lock).lock_owned().await;
        Ok(Box::new(MemTransaction {
            store: self.clone(),
            _guard: guard,
            writes: Vec::new(),
        }))
    }
}

/// A transaction over [`MemoryStore`].
///
/// Holds the store's transaction lock for its whole lifetime, so reads are
/// trivially serializable. Dropping without commit releases the lock and
/// discards the buffered writes.
struct MemTransaction {
    store: MemoryStore,
    _guard: OwnedMutexGuard<()>,
    writes: Vec<(String, String, Value)>,
}

#[async_trait]
impl Transaction for MemTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.store.check_online()?;
        let state = self.store.lock_state();
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    fn update(&mut self, collection: &str, id: &str, data: Value) {
        self.writes
            .push((collection.to_owned(), id.to_owned(), data));
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.store.check_online()?;
        {
            let mut faults = self
                .store
                .faults
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if faults.fail_next_commit {
                faults.fail_next_commit = false;
                return Err(StoreError::Conflict);
            }
        }

        let mut touched = Vec::new();
        {
            let mut state = self.store.lock_state();
            for (collection, id, patch) in &self.writes {
                let docs = state.collections.entry(collection.clone()).or_default();
                match docs.get_mut(id) {
                    Some(existing) => merge_fields(existing, patch),
                    None => {
                        docs.insert(id.clone(), patch.clone());
                    }
                }
                if !touched.contains(collection) {
                    touched.push(collection.clone());
                }
            }
        }
        for collection in touched {
            self.store.notify(&collection);
        }
        Ok(())
    }
}

// =============================================================================
// Key-value storage
// =============================================================================

/// In-memory key-value store standing in for on-device durable storage.
#[derive(Default)]
pub struct MemoryKv {
    entries: StdMutex<HashMap<String, String>>,
    fail_writes: StdMutex<bool>,
}

impl MemoryKv {
    /// Create an empty key-value store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Transport`].
    /// Reads keep working.
    pub fn fail_writes(&self, fail: bool) {
        *self
            .fail_writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = fail;
    }

    /// Snapshot every entry, for persistence by a wrapping store.
    #[must_use]
    pub fn export_entries(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replace every entry, e.g. when loading from disk.
    pub fn import_entries(&self, entries: BTreeMap<String, String>) {
        *self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = entries.into_iter().collect();
    }

    /// Direct peek for assertions.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if *self
            .fail_writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            return Err(StoreError::Transport("simulated write failure".to_owned()));
        }
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// The full in-memory backend: auth + documents + key-value storage.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub auth: Arc<MemoryAuth>,
    pub store: Arc<MemoryStore>,
    pub kv: Arc<MemoryKv>,
}

impl MemoryBackend {
    /// Create an empty backend with no signed-in user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
