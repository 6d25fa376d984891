//! Indirect-access prefetch pattern engine.
//!
//! This crate discovers correlations of the form "the value loaded by
//! instruction A, optionally shifted, computes — after base correction —
//! the address accessed by instruction B" from a stream of per-instruction
//! memory-access events, and proposes B's future addresses before the real
//! accesses occur. It is organized as:
//! 1. **Engine:** Delta-sequence tables, range classifier, discovery
//!    pipeline (candidate queue, picker, scoreboard), sliding-window
//!    matcher, relation table, and address generator.
//! 2. **Events:** Plain records exchanged with the host memory hierarchy;
//!    the engine holds no references into the host.
//! 3. **Stride:** The companion classifier/fallback prefetcher consulted
//!    for range typing and simple regular patterns.
//! 4. **Configuration & stats:** Construction-time parameters with serde
//!    defaults, and observability counters.
//!
//! The host drives the engine synchronously: deliver request, response,
//! fill, and classified-access events in simulation order, forward the
//! returned candidates to the issue path, and advance the discovery timer
//! with [`PatternEngine::tick`].
//!
//! ```
//! use ixfetch_core::{AccessEvent, EngineConfig, PatternEngine};
//!
//! let mut engine = PatternEngine::new(EngineConfig::default()).unwrap();
//! let fallback = engine.on_access(&AccessEvent {
//!     pc: Some(0x1200),
//!     vaddr: 0x8000_1040,
//!     context: Some(0),
//!     is_miss: true,
//! });
//! assert!(fallback.is_empty());
//! engine.tick(0);
//! ```

/// Common types and constants (addresses, contexts, ticks, errors).
pub mod common;
/// Engine configuration (defaults, validation, JSON parsing).
pub mod config;
/// The pattern engine and its tables.
pub mod engine;
/// Event and candidate records exchanged with the host.
pub mod event;
/// Observability counters and reporting.
pub mod stats;
/// Stride classification and fallback prefetching.
pub mod stride;

/// Construction errors; see [`config::EngineConfig::validate`].
pub use crate::common::ConfigError;
pub use crate::common::{Addr, ContextId, Pc, Tick};
/// Root configuration type; use `EngineConfig::default()` or deserialize from JSON.
pub use crate::config::EngineConfig;
/// The engine itself; construct with `PatternEngine::new`.
pub use crate::engine::PatternEngine;
pub use crate::event::{
    AccessEvent, FillEvent, NoOutstanding, PrefetchCandidate, QueueFilter, RequestEvent,
    ResponseEvent,
};
pub use crate::stats::EngineStats;
pub use crate::stride::{StrideClassifier, TableStrideClassifier};
