//! JSON file backend (asynchronous).
//!
//! Same file format and loading rules as [`super::JsonFileStore`], built
//! on `tokio::fs` and a `tokio::sync::RwLock` so no operation blocks the
//! runtime.

use super::json_file::decode;
use super::{AsyncBackend, StorageError, StorageResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// An asynchronous backend whose contents live in one JSON file.
#[derive(Debug)]
pub struct AsyncJsonFileStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl AsyncJsonFileStore {
    /// Opens the store backed by `path`, loading any existing contents.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read_to_string(&path).await {
            Ok(contents) => decode(&contents, &path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file not found, starting empty");
                Map::new()
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        debug!(path = %path.display(), keys = data.len(), "Async JSON file store opened");

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Returns true if the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl AsyncBackend for AsyncJsonFileStore {
    async fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(true)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }

    async fn persist(&self) -> StorageResult<()> {
        let contents = {
            let data = self.data.read().await;
            serde_json::to_string(&*data)?
        };
        fs::write(&self.path, contents).await?;
        debug!(path = %self.path.display(), "Async JSON file store persisted");
        Ok(())
    }
}
