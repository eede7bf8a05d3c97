//! JSON file backend (synchronous).
//!
//! The whole store is a single JSON object held in memory. It is loaded
//! once when the store is opened and written back only when
//! [`Backend::persist`] is called. No exit or signal hooks are installed;
//! the owning application decides when contents become durable.
//!
//! ## Loading Rules
//!
//! - Missing file: start empty.
//! - File present but not a JSON object: log a warning, start empty.
//! - Any other I/O failure: `open` fails with [`StorageError::Io`].

use super::{Backend, StorageError, StorageResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// A backend whose contents live in one JSON file.
///
/// # Example
///
/// ```no_run
/// use kvexpiry::storage::{Backend, JsonFileStore};
/// use serde_json::json;
///
/// let store = JsonFileStore::open("cache.json")?;
/// store.set("answer", json!(42))?;
/// store.persist()?;
/// # Ok::<(), kvexpiry::storage::StorageError>(())
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store backed by `path`, loading any existing contents.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read_to_string(&path) {
            Ok(contents) => decode(&contents, &path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file not found, starting empty");
                Map::new()
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        debug!(path = %path.display(), keys = data.len(), "JSON file store opened");

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
    pub fn len(&self) -> usize {
        match self.data.read() {
            Ok(data) => data.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Backend for JsonFileStore {
    fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        self.data.write()?.insert(key.to_string(), value);
        Ok(true)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.read()?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.data.write()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.data.read()?.keys().cloned().collect())
    }

    fn persist(&self) -> StorageResult<()> {
        let contents = serde_json::to_string(&*self.data.read()?)?;
        fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "JSON file store persisted");
        Ok(())
    }
}

/// Decodes file contents into the in-memory map.
///
/// Anything that is not a JSON object is discarded with a warning.
pub(crate) fn decode(contents: &str, path: &Path) -> Map<String, Value> {
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(path = %path.display(), "Store file is not a JSON object, starting empty");
            Map::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Store file is not valid JSON, starting empty");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("missing.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("foo", json!({"a": 1})).unwrap();
            store.set("bar", json!(2)).unwrap();
            store.persist().unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("foo").unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.get("bar").unwrap(), Some(json!(2)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_writes_are_not_durable_until_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("foo", json!(1)).unwrap();
        assert!(!path.exists());

        store.persist().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_removed_keys_leave_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json")).unwrap();

        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.remove("a").unwrap();
        store.remove("missing").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_object_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unreadable_path_is_construction_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory cannot be read as a file
        let result = JsonFileStore::open(dir.path());
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
