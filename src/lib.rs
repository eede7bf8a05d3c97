//! # kvexpiry - Expiring Keys over Any Key-Value Backend
//!
//! kvexpiry adds time-to-live semantics to storage backends that only know
//! how to `set`, `get`, `remove` and list `keys`. The backend never has to
//! understand time: each entry's expiry instant is stored as a second,
//! ordinary entry right next to its value.
//!
//! ## Features
//!
//! - **Pluggable Backends**: anything implementing [`storage::Backend`] or
//!   [`storage::AsyncBackend`]
//! - **Namespacing**: several logical caches share one backend through a
//!   `prefix + bucket` scheme
//! - **TTL Support**: human-friendly time specifications (`3` days,
//!   `Span::new().minutes(5)`, `"1h30m"`)
//! - **Sync and Async**: one expiry algorithm, driven either by blocking
//!   calls or by Tokio tasks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              kvexpiry                                   │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────────┐    ┌──────────────────────┐   │
//! │  │ TimeSpec     │───>│ AsyncExpiringKv  │<───│ ExpiringKv           │   │
//! │  │ (resolver)   │    │ (the algorithm)  │    │ (blocking front end) │   │
//! │  └──────────────┘    └────────┬─────────┘    └──────────────────────┘   │
//! │                               │ Namespace: prefix + bucket + key        │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │   Backend / AsyncBackend                                         │   │
//! │  │   MemoryStore   JsonFileStore   AsyncJsonFileStore   (custom)    │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                               ▲                                         │
//! │                  ┌────────────┴────────────┐                            │
//! │                  │  ExpirySweeper          │                            │
//! │                  │  (optional Tokio task)  │                            │
//! │                  └─────────────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use kvexpiry::expiry::{ExpiringKv, Span, TimeSpec};
//! use kvexpiry::storage::MemoryStore;
//! use serde_json::json;
//!
//! let kv = ExpiringKv::new(MemoryStore::new(), "MY_PREFIX_");
//!
//! kv.set_with_ttl("foo", json!({"a": 1}), TimeSpec::Days(1)).unwrap();
//! kv.set_with_ttl("bar", json!(2), Span::new().minutes(1)).unwrap();
//! kv.set("baz", json!("forever")).unwrap();
//!
//! assert_eq!(kv.get("foo").unwrap(), Some(json!({"a": 1})));
//!
//! // Reclaim everything that has expired so far
//! let report = kv.flush_expired().unwrap();
//! assert_eq!(report.expired, 0);
//! ```
//!
//! ## Key Layout
//!
//! For an engine with prefix `P`, bucket `B` and suffix `S` (default
//! `-expiration`), the logical key `k` occupies:
//!
//! - `PBk`: the value
//! - `PBkS`: the absolute expiry instant in Unix milliseconds (absent for
//!   entries that never expire)
//!
//! ## Lazy + Eager Expiry
//!
//! Expired entries are reclaimed in two ways:
//! 1. **Lazy**: `get` checks the expiry instant and removes a dead entry
//! 2. **Eager**: `flush_expired` sweeps the namespace; call it yourself or
//!    start an [`expiry::ExpirySweeper`]
//!
//! Nothing is reclaimed at the exact moment of expiry; expiry is detected,
//! never scheduled.
//!
//! ## Module Overview
//!
//! - [`storage`]: backend traits, errors and the bundled backends
//! - [`expiry`]: duration resolver, namespacing, engines and sweeper

pub mod expiry;
pub mod storage;

// Re-export commonly used types for convenience
pub use expiry::{
    resolve, AsyncExpiringKv, ExpiringKv, ExpirySweeper, Namespace, Span, SweeperConfig,
    TimeSpec, Ttl,
};
pub use storage::{
    AsyncBackend, AsyncJsonFileStore, Backend, JsonFileStore, MemoryStore, StorageError,
    StorageResult,
};

/// Version of kvexpiry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
