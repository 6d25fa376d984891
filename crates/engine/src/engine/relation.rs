//! Relation Table.
//!
//! The confirmed correlation store: each entry says "the value loaded by
//! `index_pc`, shifted left by `shift` and offset by `base`, predicts the
//! address accessed by `target_pc`." Insertion enforces the structural
//! invariants that keep prediction sane:
//!
//! 1. **One index per target** — no two entries may claim the same
//!    `(target_pc, context)`.
//! 2. **No immediate cycles** — an entry may not invert an existing edge
//!    (including the degenerate self-edge).
//! 3. **No redundant bases** — an index PC never keeps two entries whose
//!    bases land in the same cache line.
//!
//! A candidate that re-states an existing `(index_pc, target_pc, context)`
//! edge refreshes that entry in place; everything else claims the next
//! round-robin slot.

use crate::common::{ContextId, Pc};

/// Starting value of the shared range-priority counter.
const RANGE_PRIORITY_START: i32 = i32::MAX / 2;

/// One confirmed index→target correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationEntry {
    /// PC whose loaded value drives the prediction.
    pub index_pc: Pc,
    /// PC whose future address is predicted.
    pub target_pc: Pc,
    /// Base address correction, in the signed delta domain.
    pub base: i64,
    /// Left shift applied to the loaded value.
    pub shift: u32,
    /// True when the index PC also scans contiguous memory, warranting
    /// multi-word read-ahead.
    pub range: bool,
    /// Words read ahead when `range` is set.
    pub range_degree: usize,
    /// Context the relation was learned in.
    pub context: ContextId,
    /// Issue priority carried by every candidate this entry generates.
    pub priority: i32,
    /// True while the slot holds a live relation.
    pub valid: bool,
}

/// A match result awaiting insertion.
#[derive(Debug, Clone, Copy)]
pub struct NewRelation {
    /// PC whose loaded value drives the prediction.
    pub index_pc: Pc,
    /// PC whose future address is predicted.
    pub target_pc: Pc,
    /// Recovered base address correction.
    pub base: i64,
    /// Shift the match succeeded at.
    pub shift: u32,
    /// Range-type classification of the new edge.
    pub range: bool,
    /// Words to read ahead when `range` is set.
    pub range_degree: usize,
    /// Context the match was observed in.
    pub context: ContextId,
}

/// What became of an insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A fresh slot was claimed.
    Inserted,
    /// An existing `(index_pc, target_pc, context)` entry was refreshed.
    Updated,
    /// A structural invariant rejected the candidate.
    Rejected,
}

/// Fixed-capacity, round-robin correlation store.
#[derive(Debug)]
pub struct RelationTable {
    entries: Vec<RelationEntry>,
    cursor: usize,
    /// Shared counter handing out range-entry priorities.
    range_priority: i32,
    /// Decrement between consecutive range entries.
    group_size: i32,
    /// Mask aligning a base to cache-block granularity.
    align_mask: u64,
}

impl RelationTable {
    /// Creates a table of `capacity` slots for blocks of `block_size`
    /// bytes, spacing range priorities by `group_size`.
    pub fn new(capacity: usize, block_size: u64, group_size: i32) -> Self {
        Self {
            entries: vec![RelationEntry::default(); capacity],
            cursor: 0,
            range_priority: RANGE_PRIORITY_START,
            group_size,
            align_mask: !(block_size - 1),
        }
    }

    /// Attempts to insert `new`, applying the module-level invariants.
    ///
    /// Range-type entries draw their priority from the shared decrementing
    /// counter so a burst of ranges stays contiguous in issue order;
    /// single-access entries chain off the entry whose target is this
    /// entry's index (`parent priority + 1`), anchoring multi-hop
    /// indirections to a consistent relative order.
    pub fn insert(&mut self, new: NewRelation) -> InsertOutcome {
        if new.index_pc == new.target_pc {
            return InsertOutcome::Rejected;
        }

        let mut update_slot = None;
        for (slot, entry) in self.entries.iter().enumerate() {
            if !entry.valid || entry.context != new.context {
                continue;
            }
            if entry.index_pc == new.index_pc && entry.target_pc == new.target_pc {
                update_slot = Some(slot);
                continue;
            }
            if entry.target_pc == new.target_pc {
                return InsertOutcome::Rejected;
            }
            if entry.index_pc == new.target_pc && entry.target_pc == new.index_pc {
                return InsertOutcome::Rejected;
            }
            if entry.index_pc == new.index_pc
                && (entry.base as u64 & self.align_mask) == (new.base as u64 & self.align_mask)
            {
                return InsertOutcome::Rejected;
            }
        }

        let priority = if new.range {
            let assigned = self.range_priority;
            self.range_priority = self.range_priority.saturating_sub(self.group_size);
            assigned
        } else {
            self.find_parent(new.index_pc, new.context)
                .map_or(0, |parent| parent.priority.saturating_add(1))
        };

        let (slot, outcome) = match update_slot {
            Some(slot) => (slot, InsertOutcome::Updated),
            None => {
                let slot = self.cursor;
                self.cursor = (self.cursor + 1) % self.entries.len();
                (slot, InsertOutcome::Inserted)
            }
        };
        self.entries[slot] = RelationEntry {
            index_pc: new.index_pc,
            target_pc: new.target_pc,
            base: new.base,
            shift: new.shift,
            range: new.range,
            range_degree: new.range_degree,
            context: new.context,
            priority,
            valid: true,
        };
        outcome
    }

    /// The entry whose target is `index_pc` in `context`, if any — the
    /// upstream hop of a chained indirection.
    fn find_parent(&self, index_pc: Pc, context: ContextId) -> Option<&RelationEntry> {
        self.entries
            .iter()
            .find(|e| e.valid && e.context == context && e.target_pc == index_pc)
    }

    /// The valid entry predicting `(target_pc, context)`, if any.
    pub fn lookup(&self, target_pc: Pc, context: ContextId) -> Option<&RelationEntry> {
        self.entries
            .iter()
            .find(|e| e.valid && e.context == context && e.target_pc == target_pc)
    }

    /// Valid entries, in slot order.
    pub fn iter_valid(&self) -> impl Iterator<Item = &RelationEntry> {
        self.entries.iter().filter(|e| e.valid)
    }

    /// All slots, for scanning.
    pub fn entries(&self) -> &[RelationEntry] {
        &self.entries
    }
}
