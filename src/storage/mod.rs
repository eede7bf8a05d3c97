//! Storage Backend Module
//!
//! This module defines the backend capability the expiration engines are
//! layered on, plus the backends that ship with kvexpiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  Backend (sync)          │   │  AsyncBackend            │
//! │  set / get / remove /    │   │  set / get / remove /    │
//! │  keys / persist          │   │  keys / persist (async)  │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │                              │
//!     ┌────────┴────────┐                     │
//!     ▼                 ▼                     ▼
//! ┌──────────┐   ┌──────────────┐   ┌────────────────────┐
//! │MemoryStore│  │JsonFileStore │   │AsyncJsonFileStore  │
//! └──────────┘   └──────────────┘   └────────────────────┘
//! ```
//!
//! Backends know nothing about time. Any type implementing one of the two
//! traits can sit under an expiration engine; `Arc<B>` implements the
//! traits too, so several engines can share one backend.

pub mod backend;
pub mod error;
pub mod json_file;
pub mod json_file_async;
pub mod memory;

// Re-export commonly used types
pub use backend::{AsyncBackend, Backend};
pub(crate) use backend::Blocking;
pub use error::{StorageError, StorageResult};
pub use json_file::JsonFileStore;
pub use json_file_async::AsyncJsonFileStore;
pub use memory::MemoryStore;
