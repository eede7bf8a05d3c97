//! Expiration Engine
//!
//! This module implements TTL semantics on top of any [`AsyncBackend`].
//! The backend only ever sees plain `set`/`get`/`remove`/`keys` calls; the
//! expiry instant of a key is just another backend entry stored next to
//! the value (see [`Namespace`]).
//!
//! ## Reclamation
//!
//! ```text
//!            set(k, v, ttl)
//!   absent ─────────────────> present (TTL) ──┐
//!     │  ▲                        ▲   │        │ now >= instant and
//!     │  │ remove / flush         │   │        │ get / flush_expired_item /
//!     │  │                 set(ttl)   │ set    │ flush_expired
//!     ▼  │                        │   ▼        │
//!   present (no TTL) <────────────┘            ▼
//!                                            absent
//! ```
//!
//! Expired entries are detected, never scheduled:
//! 1. **Lazy**: `get` checks the expiry instant first and reclaims on the spot
//! 2. **Eager**: `flush_expired` sweeps the whole namespace on demand
//!
//! The comparison is inclusive: an entry expires exactly at its instant.
//! When an entry is reclaimed its value and its expiry instant are removed
//! together before "absent" is reported.
//!
//! ## Concurrency
//!
//! Independent backend calls (the two deletes of `remove`, every delete of
//! `flush`, every item of `flush_expired`) are issued concurrently and
//! joined. All of them run to completion even if one fails; the first
//! failure is then returned and nothing is rolled back.

use super::{Clock, Namespace, SystemClock, TimeSpec};
use crate::storage::{AsyncBackend, StorageResult};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Outcome of one [`AsyncExpiringKv::flush_expired`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Stored keys examined
    pub scanned: usize,
    /// Entries found expired and removed
    pub expired: usize,
}

/// Remaining lifetime of a logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// No value is stored (or it just expired)
    Absent,
    /// The value never expires
    Permanent,
    /// The value expires after this long
    Remaining(Duration),
}

/// An expiring cache over an asynchronous backend.
///
/// # Example
///
/// ```
/// use kvexpiry::expiry::{AsyncExpiringKv, Span};
/// use kvexpiry::storage::AsyncJsonFileStore;
/// use serde_json::json;
///
/// # async fn demo() -> Result<(), kvexpiry::storage::StorageError> {
/// let store = AsyncJsonFileStore::open("cache.json").await?;
/// let kv = AsyncExpiringKv::new(store, "MY_PREFIX_");
///
/// kv.set_with_ttl("session", json!({"user": 7}), Span::new().minutes(30)).await?;
/// assert_eq!(kv.get("session").await?, Some(json!({"user": 7})));
/// # Ok(())
/// # }
/// ```
pub struct AsyncExpiringKv<B> {
    backend: B,
    namespace: Namespace,
    clock: Arc<dyn Clock>,
}

impl<B> std::fmt::Debug for AsyncExpiringKv<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExpiringKv")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl<B: AsyncBackend> AsyncExpiringKv<B> {
    /// Creates an engine with the given prefix, no bucket and the default
    /// suffix.
    pub fn new(backend: B, prefix: impl Into<String>) -> Self {
        Self::with_namespace(backend, Namespace::new(prefix))
    }

    /// Creates an engine with a fully configured namespace.
    pub fn with_namespace(backend: B, namespace: Namespace) -> Self {
        Self {
            backend,
            namespace,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Stores `value` without touching any existing expiry.
    ///
    /// If `key` was previously stored with a TTL, that expiry instant stays
    /// in force. Use [`Self::set_permanent`] to drop it.
    pub async fn set(&self, key: &str, value: Value) -> StorageResult<bool> {
        self.store(key, value, None).await
    }

    /// Stores `value` and records an expiry instant of `now + ttl`.
    ///
    /// `TimeSpec::Days(0)` records no expiry at all, like [`Self::set`].
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: Value,
        ttl: impl Into<TimeSpec>,
    ) -> StorageResult<bool> {
        self.store(key, value, Some(ttl.into())).await
    }

    /// Stores `value` and clears any expiry recorded for `key`.
    pub async fn set_permanent(&self, key: &str, value: Value) -> StorageResult<bool> {
        self.backend
            .set(&self.namespace.stored_key(key), value)
            .await?;
        self.backend
            .remove(&self.namespace.expiration_key(key))
            .await?;
        trace!(key, "Stored permanent entry");
        Ok(true)
    }

    async fn store(&self, key: &str, value: Value, ttl: Option<TimeSpec>) -> StorageResult<bool> {
        self.backend
            .set(&self.namespace.stored_key(key), value)
            .await?;

        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_unset()) {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            let instant = self.clock.now_millis().saturating_add(ttl_ms);
            self.backend
                .set(&self.namespace.expiration_key(key), Value::from(instant))
                .await?;
            trace!(key, expires_at = instant, "Stored entry with expiry");
        } else {
            trace!(key, "Stored entry");
        }

        Ok(true)
    }

    /// Returns the value for `key`.
    ///
    /// Returns `None` if the key was never set, was removed, or has expired.
    /// An expired entry is reclaimed before `None` is returned.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        if self.flush_expired_item(key).await? {
            return Ok(None);
        }
        self.backend.get(&self.namespace.stored_key(key)).await
    }

    /// Returns how long `key` has left to live.
    ///
    /// Like [`Self::get`], an expired entry is reclaimed on the way.
    pub async fn ttl(&self, key: &str) -> StorageResult<Ttl> {
        if self.flush_expired_item(key).await? {
            return Ok(Ttl::Absent);
        }
        if self
            .backend
            .get(&self.namespace.stored_key(key))
            .await?
            .is_none()
        {
            return Ok(Ttl::Absent);
        }

        let raw = self
            .backend
            .get(&self.namespace.expiration_key(key))
            .await?;
        match raw.as_ref().and_then(expiry_instant) {
            Some(instant) => {
                let remaining = (instant - self.clock.now_millis() as f64).max(0.0);
                Ok(Ttl::Remaining(Duration::from_millis(remaining as u64)))
            }
            None => Ok(Ttl::Permanent),
        }
    }

    /// Removes the value and the expiry instant for `key`.
    ///
    /// Succeeds whether or not either exists.
    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        let stored = self.namespace.stored_key(key);
        let expiration = self.namespace.expiration_key(key);

        let (value_removed, expiry_removed) = futures::join!(
            self.backend.remove(&stored),
            self.backend.remove(&expiration)
        );
        value_removed?;
        expiry_removed?;

        trace!(key, "Removed entry");
        Ok(())
    }

    /// Removes every backend key inside this engine's namespace.
    ///
    /// Returns the number of backend keys removed (values and expiry
    /// instants alike).
    pub async fn flush(&self) -> StorageResult<usize> {
        let keys = self.backend.keys().await?;
        let doomed: Vec<&String> = keys
            .iter()
            .filter(|key| self.namespace.contains(key))
            .collect();

        let results = join_all(doomed.iter().map(|key| self.backend.remove(key))).await;
        for result in results {
            result?;
        }

        debug!(
            scope = self.namespace.scope(),
            removed = doomed.len(),
            "Namespace flushed"
        );
        Ok(doomed.len())
    }

    /// Reclaims every expired entry in this engine's namespace.
    ///
    /// Meant to be called periodically by the application, or by an
    /// [`super::ExpirySweeper`].
    pub async fn flush_expired(&self) -> StorageResult<SweepReport> {
        let keys = self.backend.keys().await?;
        let logical: Vec<&str> = keys
            .iter()
            .filter_map(|key| self.namespace.logical_key(key))
            .collect();

        let results = join_all(logical.iter().map(|key| self.flush_expired_item(key))).await;

        let mut report = SweepReport {
            scanned: logical.len(),
            expired: 0,
        };
        for result in results {
            if result? {
                report.expired += 1;
            }
        }

        if report.expired > 0 {
            debug!(
                scope = self.namespace.scope(),
                scanned = report.scanned,
                expired = report.expired,
                "Expired entries reclaimed"
            );
        }
        Ok(report)
    }

    /// Reclaims `key` if its expiry instant has passed.
    ///
    /// Returns `true` if the entry was expired and has been removed. An
    /// entry without an expiry instant, or with one that does not read as a
    /// number, never expires.
    pub async fn flush_expired_item(&self, key: &str) -> StorageResult<bool> {
        let expiration = self.namespace.expiration_key(key);

        let raw = self.backend.get(&expiration).await?;
        let instant = match raw.as_ref().and_then(expiry_instant) {
            Some(instant) => instant,
            None => return Ok(false),
        };

        if (self.clock.now_millis() as f64) < instant {
            return Ok(false);
        }

        let stored = self.namespace.stored_key(key);
        let (expiry_removed, value_removed) = futures::join!(
            self.backend.remove(&expiration),
            self.backend.remove(&stored)
        );
        expiry_removed?;
        value_removed?;

        debug!(key, expired_at = instant, "Expired entry reclaimed");
        Ok(true)
    }
}

/// Reads an expiry instant from a backend value.
///
/// Falsy values (`null`, `false`, `0`, `""`) mean no expiry was recorded.
/// Other numbers are taken as-is. Everything else is read through its text
/// form (arrays joined with commas) by a lenient integer parse: leading
/// whitespace, an optional sign, an optional `0x` prefix, then as many
/// digits as present. Text with no leading digits yields `None`.
pub(crate) fn expiry_instant(raw: &Value) -> Option<f64> {
    match raw {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) => n.as_f64().filter(|instant| *instant != 0.0),
        Value::String(s) if s.is_empty() => None,
        other => parse_leading_integer(&as_text(other)),
    }
}

fn as_text(raw: &Value) -> String {
    match raw {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(as_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn parse_leading_integer(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let value = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(None, |acc: Option<f64>, digit| {
            Some(acc.unwrap_or(0.0) * f64::from(radix) + f64::from(digit))
        })?;
    Some(if negative { -value } else { value })
}
