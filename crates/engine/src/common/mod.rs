//! Shared primitives used across the engine.
//!
//! This module collects the small building blocks every table and callback
//! shares: primitive type aliases, fixed-width constants, and the error
//! types surfaced at construction time.

/// Construction-time error types.
pub mod error;
/// Primitive type aliases and width constants.
pub mod types;

pub use error::ConfigError;
pub use types::{Addr, ContextId, Pc, Tick, WORD_BYTES};
