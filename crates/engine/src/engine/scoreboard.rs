//! Indirect Candidate Scoreboard.
//!
//! Each picked index PC gets a scoreboard entry that counts which PCs miss
//! while the candidate is under observation. A miss PC whose count reaches
//! the promotion threshold graduates to target status: the engine then
//! starts collecting its address delta sequence and range samples. The
//! per-entry candidate map is deliberately tiny; PCs that arrive once it is
//! full are simply not tracked.

use tracing::trace;

use crate::common::{ContextId, Pc};

/// Miss bookkeeping for one picked index PC.
#[derive(Debug, Clone)]
pub struct ScoreboardEntry {
    pc: Pc,
    context: ContextId,
    /// Bounded miss-PC counters, in insertion order.
    counts: Vec<(Pc, u32)>,
    valid: bool,
}

impl ScoreboardEntry {
    fn new(candidate_cap: usize) -> Self {
        Self {
            pc: 0,
            context: 0,
            counts: Vec::with_capacity(candidate_cap),
            valid: false,
        }
    }

    fn renew(&mut self, pc: Pc, context: ContextId) {
        self.pc = pc;
        self.context = context;
        self.counts.clear();
        self.valid = true;
    }

    /// Index PC under observation.
    pub fn pc(&self) -> Pc {
        self.pc
    }

    /// Context the entry was registered in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// True while the slot is allocated.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tracked miss PCs and their counts.
    pub fn candidates(&self) -> &[(Pc, u32)] {
        &self.counts
    }

    /// Counts one miss of `miss_pc`; returns true when the count reaches
    /// `threshold` and the candidate is promoted.
    ///
    /// A fresh miss PC is admitted with a zero count while room remains, so
    /// promotion with threshold `t` happens on report `t + 1`. The promoted
    /// candidate is removed, making the promotion fire exactly once.
    fn update_miss(&mut self, miss_pc: Pc, threshold: u32, cap: usize) -> bool {
        if let Some(pos) = self.counts.iter().position(|&(pc, _)| pc == miss_pc) {
            self.counts[pos].1 += 1;
            if self.counts[pos].1 >= threshold {
                let _ = self.counts.remove(pos);
                return true;
            }
        } else if self.counts.len() < cap {
            self.counts.push((miss_pc, 0));
        }
        false
    }
}

/// Fixed-capacity, round-robin scoreboard.
#[derive(Debug)]
pub struct Scoreboard {
    entries: Vec<ScoreboardEntry>,
    cursor: usize,
    candidate_cap: usize,
    threshold: u32,
}

impl Scoreboard {
    /// Creates a scoreboard of `capacity` entries, each tracking up to
    /// `candidate_cap` miss PCs, promoting at `threshold`.
    pub fn new(capacity: usize, candidate_cap: usize, threshold: u32) -> Self {
        Self {
            entries: (0..capacity)
                .map(|_| ScoreboardEntry::new(candidate_cap))
                .collect(),
            cursor: 0,
            candidate_cap,
            threshold,
        }
    }

    /// Opens observation for a picked `(pc, context)`, claiming the next
    /// round-robin slot. An index PC already under observation in the same
    /// context keeps its counts.
    pub fn register(&mut self, pc: Pc, context: ContextId) {
        if self
            .entries
            .iter()
            .any(|e| e.valid && e.pc == pc && e.context == context)
        {
            return;
        }
        self.entries[self.cursor].renew(pc, context);
        self.cursor = (self.cursor + 1) % self.entries.len();
    }

    /// Reports a miss of `miss_pc` to every entry observing `context`.
    ///
    /// Returns true on the first promotion; the caller registers the
    /// promoted PC as a target and stops, so one miss never promotes the
    /// same PC under several observers at once.
    pub fn note_miss(&mut self, miss_pc: Pc, context: ContextId) -> bool {
        let (threshold, cap) = (self.threshold, self.candidate_cap);
        for entry in &mut self.entries {
            if !entry.valid || entry.context != context {
                continue;
            }
            trace!(miss_pc, observer = entry.pc, "scoreboard miss counted");
            if entry.update_miss(miss_pc, threshold, cap) {
                return true;
            }
        }
        false
    }

    /// All slots, for scanning.
    pub fn entries(&self) -> &[ScoreboardEntry] {
        &self.entries
    }
}
