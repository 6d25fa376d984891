//! Event and candidate records exchanged with the host simulator.
//!
//! The engine holds no references back into the host: inputs arrive as plain
//! event records through the `PatternEngine::on_*` callbacks and outputs
//! leave as plain [`PrefetchCandidate`] records. Attributes the host may not
//! know for a given access are `Option`s; an event missing a required
//! attribute is dropped silently and counted.

use crate::common::{Addr, ContextId, Pc};

/// An outgoing load request observed below the first private cache level.
///
/// Drives the Target Delta Table and, on sequence readiness, the matcher.
#[derive(Debug, Clone, Copy)]
pub struct RequestEvent {
    /// Program counter of the load, when the request carries one.
    pub pc: Option<Pc>,
    /// Virtual address being accessed, when known.
    pub vaddr: Option<Addr>,
    /// Execution context of the access.
    pub context: Option<ContextId>,
}

/// A data response observed below the first private cache level.
///
/// Drives the Index Delta Table; the first word of the payload is taken as
/// the loaded value.
#[derive(Debug, Clone, Copy)]
pub struct ResponseEvent<'a> {
    /// Program counter of the load the response answers.
    pub pc: Option<Pc>,
    /// Execution context of the access.
    pub context: Option<ContextId>,
    /// Response payload, little-endian, at least one word long to be usable.
    pub data: Option<&'a [u8]>,
}

/// A cache-line fill or hit together with its complete block data.
///
/// Drives the Prefetch Address Generator.
#[derive(Debug, Clone, Copy)]
pub struct FillEvent<'a> {
    /// Program counter of the access that produced the fill.
    pub pc: Option<Pc>,
    /// Physical address of the access.
    pub paddr: Addr,
    /// Execution context of the access.
    pub context: Option<ContextId>,
    /// The block contents, when the host can supply them.
    pub data: Option<&'a [u8]>,
}

/// Hit/miss classification of a first-level access.
///
/// Drives scoreboard miss counting, Index Queue seeding, and the stride
/// fallback.
#[derive(Debug, Clone, Copy)]
pub struct AccessEvent {
    /// Program counter of the access.
    pub pc: Option<Pc>,
    /// Virtual address of the access.
    pub vaddr: Addr,
    /// Execution context of the access.
    pub context: Option<ContextId>,
    /// Whether the access missed the first private cache level.
    pub is_miss: bool,
}

/// A predicted future access, ready for translation and issue by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchCandidate {
    /// Predicted address, aligned to cache-block granularity.
    pub addr: Addr,
    /// PC the prediction is attributed to. For an indirect relation this is
    /// the *target* PC, so a chained relation can trigger on the prefetched
    /// data when it arrives.
    pub pc: Pc,
    /// Context the prediction belongs to.
    pub context: ContextId,
    /// Issue priority; higher issues first.
    pub priority: i32,
}

/// The host's view of its outstanding prefetch queues.
///
/// Consulted before a candidate is emitted so the engine never proposes a
/// line that is already queued or awaiting address translation.
pub trait QueueFilter {
    /// Returns true when block-aligned `addr` is already outstanding for
    /// `context` in either the ready or the translation-pending queue.
    fn already_queued(&self, addr: Addr, context: ContextId) -> bool;
}

/// A [`QueueFilter`] that reports nothing outstanding.
///
/// For hosts without an outstanding queue, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOutstanding;

impl QueueFilter for NoOutstanding {
    fn already_queued(&self, _addr: Addr, _context: ContextId) -> bool {
        false
    }
}
