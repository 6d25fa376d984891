//! Primitive type aliases shared by all engine tables.
//!
//! The engine speaks unsigned byte addresses at its boundary and learns in a
//! signed 64-bit delta domain internally; these aliases keep the boundary
//! types readable without introducing newtype friction in hot loops.

/// A physical or virtual byte address.
pub type Addr = u64;

/// An instruction address (program counter).
pub type Pc = u64;

/// Identifies the logical execution stream (thread/process) an access
/// belongs to. Sequences and matches never cross context identifiers.
pub type ContextId = u32;

/// A point in simulated time, in whatever unit the host event loop uses.
pub type Tick = u64;

/// Width in bytes of the machine word extracted from fill data when
/// reconstructing predicted addresses.
pub const WORD_BYTES: usize = 4;
