//! In-memory backend.
//!
//! The simplest conforming [`Backend`]: a `HashMap` behind an `RwLock`.
//! Nothing is persisted, which makes it the natural choice for tests and
//! for caches that only need to live as long as the process.

use super::{Backend, StorageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// A thread-safe, non-persistent backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, including expiration keys.
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

impl Backend for MemoryStore {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        assert!(store.set("name", json!("Ariz")).unwrap());
        assert_eq!(store.get("name").unwrap(), Some(json!("Ariz")));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.set("key", json!(1)).unwrap();

        store.remove("key").unwrap();
        store.remove("key").unwrap();

        assert_eq!(store.get("key").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_live() {
        let store = MemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.remove("a").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    store.set(&key, json!(j)).unwrap();
                    store.get(&key).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }
}
