//! Backend traits for the expiration engines.
//!
//! A backend only knows four unconditional operations: `set`, `get`,
//! `remove` and `keys`. It has no notion of time; expiry is layered on top
//! by [`crate::expiry`].
//!
//! Two variants exist, one per scheduling model. Both share the same
//! contract:
//!
//! - `set` followed by `get` on the same key returns the value just written
//! - `remove` on an absent key is a no-op, not an error
//! - `keys` lists every key written and not yet removed, at call time
//! - values round-trip unchanged through whatever encoding the backend uses

use super::StorageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A synchronous key-value backend.
///
/// Every operation completes before it returns.
///
/// # Example
///
/// ```
/// use kvexpiry::storage::{Backend, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.set("greeting", json!("hello")).unwrap();
/// assert_eq!(store.get("greeting").unwrap(), Some(json!("hello")));
/// ```
pub trait Backend: Send + Sync {
    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: Value) -> StorageResult<bool>;

    /// Returns the value under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key currently stored. Order is unspecified.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Makes previous writes durable.
    ///
    /// In-memory backends have nothing to do. File-backed backends write
    /// their contents out; the owning application decides when.
    fn persist(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// An asynchronous key-value backend.
///
/// Same contract as [`Backend`], but every operation may suspend.
#[async_trait]
pub trait AsyncBackend: Send + Sync {
    /// Stores `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: Value) -> StorageResult<bool>;

    /// Returns the value under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key currently stored. Order is unspecified.
    async fn keys(&self) -> StorageResult<Vec<String>>;

    /// Makes previous writes durable.
    async fn persist(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        (**self).set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        (**self).get(key)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn persist(&self) -> StorageResult<()> {
        (**self).persist()
    }
}

#[async_trait]
impl<B: AsyncBackend + ?Sized> AsyncBackend for Arc<B> {
    async fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        (**self).set(key, value).await
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key).await
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys().await
    }

    async fn persist(&self) -> StorageResult<()> {
        (**self).persist().await
    }
}

/// Presents a synchronous [`Backend`] as an [`AsyncBackend`].
///
/// Every returned future is ready on first poll, so driving it with a
/// blocking executor never parks the thread.
#[derive(Debug)]
pub(crate) struct Blocking<B>(pub(crate) B);

impl<B> Blocking<B> {
    pub(crate) fn inner(&self) -> &B {
        &self.0
    }
}

#[async_trait]
impl<B: Backend> AsyncBackend for Blocking<B> {
    async fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        self.0.set(key, value)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.0.get(key)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.0.remove(key)
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        self.0.keys()
    }

    async fn persist(&self) -> StorageResult<()> {
        self.0.persist()
    }
}
