//! Errors surfaced while building an engine.
//!
//! Construction is the only fallible path in the crate. Once an engine
//! exists, every defensive policy is a silent drop recorded in
//! [`EngineStats`](crate::stats::EngineStats); see the crate-level docs.

use thiserror::Error;

/// Reasons an [`EngineConfig`](crate::config::EngineConfig) is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A capacity, length, or period that must be non-zero was zero.
    #[error("{field} must be non-zero")]
    ZeroField {
        /// Name of the offending configuration field.
        field: &'static str,
    },

    /// The target sequence is longer than the window it must slide inside,
    /// so the matcher could never compare anything.
    #[error("target_diff_num ({target}) exceeds index_diff_num ({index})")]
    WindowInverted {
        /// Configured index delta-sequence length.
        index: usize,
        /// Configured target delta-sequence length.
        target: usize,
    },

    /// The shift set is empty; at least one shift amount is required.
    #[error("shift_set must contain at least one shift amount")]
    EmptyShiftSet,

    /// A shift amount would discard every bit of an extracted word.
    #[error("shift amount {0} out of range (must be < 32)")]
    ShiftTooLarge(u32),

    /// Cache blocks must be power-of-two sized for offset masking.
    #[error("block_size {0} is not a power of two")]
    BlockNotPowerOfTwo(u64),

    /// The configuration text could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
