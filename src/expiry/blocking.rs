//! Synchronous Expiration Engine
//!
//! [`ExpiringKv`] is a thin blocking front end over [`AsyncExpiringKv`].
//! The synchronous backend is presented as an async one whose futures are
//! ready on first poll, and each call is driven to completion with a
//! blocking executor. The expiry algorithm itself lives only in
//! [`super::engine`].

use super::engine::{AsyncExpiringKv, SweepReport, Ttl};
use super::{Clock, Namespace, TimeSpec};
use crate::storage::{Backend, Blocking, StorageResult};
use futures::executor::block_on;
use serde_json::Value;
use std::sync::Arc;

/// An expiring cache over a synchronous backend.
///
/// Every call completes before it returns. The engine takes no locks; any
/// atomicity across calls is up to the backend.
///
/// # Example
///
/// ```
/// use kvexpiry::expiry::{ExpiringKv, Span, TimeSpec};
/// use kvexpiry::storage::MemoryStore;
/// use serde_json::json;
///
/// let kv = ExpiringKv::new(MemoryStore::new(), "MY_PREFIX_");
///
/// kv.set_with_ttl("foo", json!({"a": 1}), TimeSpec::Days(1)).unwrap();
/// kv.set_with_ttl("bar", json!(2), Span::new().minutes(1)).unwrap();
///
/// assert_eq!(kv.get("foo").unwrap(), Some(json!({"a": 1})));
/// assert_eq!(kv.get("bar").unwrap(), Some(json!(2)));
/// ```
#[derive(Debug)]
pub struct ExpiringKv<B> {
    inner: AsyncExpiringKv<Blocking<B>>,
}

impl<B: Backend> ExpiringKv<B> {
    /// Creates an engine with the given prefix, no bucket and the default
    /// suffix.
    pub fn new(backend: B, prefix: impl Into<String>) -> Self {
        Self::with_namespace(backend, Namespace::new(prefix))
    }

    /// Creates an engine with a fully configured namespace.
    pub fn with_namespace(backend: B, namespace: Namespace) -> Self {
        Self {
            inner: AsyncExpiringKv::with_namespace(Blocking(backend), namespace),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: self.inner.with_clock(clock),
        }
    }

    pub fn backend(&self) -> &B {
        self.inner.backend().inner()
    }

    pub fn namespace(&self) -> &Namespace {
        self.inner.namespace()
    }

    /// See [`AsyncExpiringKv::set`].
    pub fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        block_on(self.inner.set(key, value))
    }

    /// See [`AsyncExpiringKv::set_with_ttl`].
    pub fn set_with_ttl(
        &self,
        key: &str,
        value: Value,
        ttl: impl Into<TimeSpec>,
    ) -> StorageResult<bool> {
        block_on(self.inner.set_with_ttl(key, value, ttl))
    }

    /// See [`AsyncExpiringKv::set_permanent`].
    pub fn set_permanent(&self, key: &str, value: Value) -> StorageResult<bool> {
        block_on(self.inner.set_permanent(key, value))
    }

    /// See [`AsyncExpiringKv::get`].
    pub fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        block_on(self.inner.get(key))
    }

    /// See [`AsyncExpiringKv::ttl`].
    pub fn ttl(&self, key: &str) -> StorageResult<Ttl> {
        block_on(self.inner.ttl(key))
    }

    /// See [`AsyncExpiringKv::remove`].
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        block_on(self.inner.remove(key))
    }

    /// See [`AsyncExpiringKv::flush`].
    pub fn flush(&self) -> StorageResult<usize> {
        block_on(self.inner.flush())
    }

    /// See [`AsyncExpiringKv::flush_expired`].
    pub fn flush_expired(&self) -> StorageResult<SweepReport> {
        block_on(self.inner.flush_expired())
    }

    /// See [`AsyncExpiringKv::flush_expired_item`].
    pub fn flush_expired_item(&self, key: &str) -> StorageResult<bool> {
        block_on(self.inner.flush_expired_item(key))
    }
}
