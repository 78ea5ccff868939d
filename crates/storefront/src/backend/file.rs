//! File-backed store for local development and the CLI.
//!
//! Wraps [`MemoryStore`]/[`MemoryKv`] and writes the whole data set to a
//! JSON file after every mutation. Small catalogs only; this is the
//! owner-tooling and demo backend, not a database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use super::{Document, DocumentStore, KeyValueStore, MemoryKv, MemoryStore, StoreError,
            StoreResult, Transaction};

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FileContents {
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    kv: BTreeMap<String, String>,
}

/// Document + key-value store persisted to a single JSON file.
#[derive(Clone)]
pub struct JsonFileStore {
    inner: MemoryStore,
    kv: Arc<MemoryKv>,
    path: Arc<PathBuf>,
}

impl JsonFileStore {
    /// Open a store file, creating an empty one if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the file cannot be read and
    /// [`StoreError::Serialization`] if it holds invalid JSON.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Transport(format!("read {}: {e}", path.display())))?;
            serde_json::from_str::<FileContents>(&raw)?
        } else {
            FileContents::default()
        };

        let inner = MemoryStore::new();
        inner.import_collections(contents.collections);
        let kv = MemoryKv::new();
        kv.import_entries(contents.kv);

        Ok(Self {
            inner,
            kv: Arc::new(kv),
            path: Arc::new(path),
        })
    }

    /// Write the current data set to disk via a temp file + rename.
    fn save(&self) -> StoreResult<()> {
        let contents = FileContents {
            collections: self.inner.export_collections(),
            kv: self.kv.export_entries(),
        };
        let raw = serde_json::to_string_pretty(&contents)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)
            .and_then(|()| std::fs::rename(&tmp, self.path.as_ref()))
            .map_err(|e| StoreError::Transport(format!("write {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get_document(collection, id).await
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.list_documents(collection).await
    }

    async fn set_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.inner.set_document(collection, id, data).await?;
        self.save()
    }

    async fn add_document(&self, collection: &str, data: Value) -> StoreResult<String> {
        let id = self.inner.add_document(collection, data).await?;
        self.save()?;
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.inner.update_document(collection, id, data).await?;
        self.save()
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete_document(collection, id).await?;
        self.save()
    }

    fn watch_collection(&self, collection: &str) -> watch::Receiver<Vec<Document>> {
        self.inner.watch_collection(collection)
    }

    fn watch_document(&self, collection: &str, id: &str) -> watch::Receiver<Option<Document>> {
        self.inner.watch_document(collection, id)
    }

    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>> {
        let inner = self.inner.begin_transaction().await?;
        Ok(Box::new(FileTransaction {
            inner,
            store: self.clone(),
        }))
    }
}

/// Transaction wrapper that flushes to disk after a successful commit.
struct FileTransaction {
    inner: Box<dyn Transaction>,
    store: JsonFileStore,
}

#[async_trait]
impl Transaction for FileTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    fn update(&mut self, collection: &str, id: &str, data: Value) {
        self.inner.update(collection, id, data);
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit().await?;
        self.store.save()
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.kv.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.kv.set(key, value).await?;
        self.save()
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.kv.remove(key).await?;
        self.save()
    }
}
