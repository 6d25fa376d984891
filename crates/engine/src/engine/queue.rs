//! Index Candidate Queue and picker.
//!
//! Holds PCs waiting for a chance to prove themselves as indices. Each
//! candidate carries how often it has been tried and how often a try led to
//! a confirmed match; the picker periodically selects the candidate with
//! the best match/try ratio for another round of observation.

use tracing::trace;

use crate::common::{ContextId, Pc};

/// Keeps an untried candidate's weight finite while ranking it above
/// anything already tried without a match.
const WEIGHT_EPSILON: f64 = 1e-6;

/// One discovery candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueEntry {
    pc: Pc,
    context: ContextId,
    tried: u32,
    matched: u32,
    valid: bool,
}

impl QueueEntry {
    /// PC of this candidate.
    pub fn pc(&self) -> Pc {
        self.pc
    }

    /// Context the candidate was observed in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Times the picker has selected this candidate.
    pub fn tried(&self) -> u32 {
        self.tried
    }

    /// Times a selection led to a confirmed match.
    pub fn matched(&self) -> u32 {
        self.matched
    }

    /// True while the slot is allocated.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Selection weight. Never persisted; recomputed on every scan.
    pub fn weight(&self) -> f64 {
        f64::from(self.matched + 1) / (f64::from(self.tried) + WEIGHT_EPSILON)
    }
}

/// Fixed-capacity, round-robin candidate queue.
#[derive(Debug)]
pub struct IndexQueue {
    entries: Vec<QueueEntry>,
    cursor: usize,
}

impl IndexQueue {
    /// Creates a queue with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![QueueEntry::default(); capacity],
            cursor: 0,
        }
    }

    /// Inserts `(pc, context)` unless already queued; the slot at the write
    /// cursor is evicted once the queue is full.
    pub fn insert(&mut self, pc: Pc, context: ContextId) {
        if self
            .entries
            .iter()
            .any(|e| e.valid && e.pc == pc && e.context == context)
        {
            return;
        }
        trace!(pc, context, "index candidate enqueued");
        self.entries[self.cursor] = QueueEntry {
            pc,
            context,
            tried: 0,
            matched: 0,
            valid: true,
        };
        self.cursor = (self.cursor + 1) % self.entries.len();
    }

    /// Selects the highest-weight candidate, charges it a try, and returns
    /// its identity. Ties go to the first candidate found in slot order.
    pub fn pick(&mut self) -> Option<(Pc, ContextId)> {
        let mut best: Option<usize> = None;
        let mut best_weight = f64::MIN;
        for (slot, entry) in self.entries.iter().enumerate() {
            if !entry.valid {
                continue;
            }
            let weight = entry.weight();
            if weight > best_weight {
                best_weight = weight;
                best = Some(slot);
            }
        }
        best.map(|slot| {
            let entry = &mut self.entries[slot];
            entry.tried += 1;
            (entry.pc, entry.context)
        })
    }

    /// Credits a confirmed match to `(pc, context)`, raising its weight for
    /// future picks. Unknown candidates are ignored.
    pub fn credit_match(&mut self, pc: Pc, context: ContextId) {
        for entry in &mut self.entries {
            if entry.valid && entry.pc == pc && entry.context == context {
                entry.matched += 1;
                break;
            }
        }
    }

    /// All slots, for scanning.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }
}
