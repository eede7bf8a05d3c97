//! Expiry Module
//!
//! This module layers TTL semantics over the backends in
//! [`crate::storage`]. It includes the duration resolver, key namespacing,
//! the expiration engine in both scheduling models, and an optional
//! background sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌───────────────────────────┐
//! │  ExpiringKv (sync)   │───────>│  AsyncExpiringKv          │
//! │  block_on(...)       │        │  set / get / ttl / remove │
//! └──────────────────────┘        │  flush / flush_expired    │
//!                                 └─────────────┬─────────────┘
//!   TimeSpec ──resolve──> ms                    │ Namespace
//!   Clock    ──now──────> ms                    ▼
//!                                 ┌───────────────────────────┐
//!                                 │  Backend / AsyncBackend   │
//!                                 └───────────────────────────┘
//!                                               ▲
//!                                 ┌─────────────┴─────────────┐
//!                                 │  ExpirySweeper (optional) │
//!                                 └───────────────────────────┘
//! ```

pub mod blocking;
pub mod clock;
pub mod duration;
pub mod engine;
pub mod namespace;
pub mod sweeper;

// Re-export commonly used types
pub use blocking::ExpiringKv;
pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{resolve, Span, TimeSpec, TimeSpecError, MILLIS_PER_DAY};
pub use engine::{AsyncExpiringKv, SweepReport, Ttl};
pub use namespace::{Namespace, DEFAULT_SUFFIX};
pub use sweeper::{start_expiry_sweeper, ExpirySweeper, SweeperConfig};
