//! Delta-Sequence Tables.
//!
//! A delta-sequence table tracks, per instruction PC, the running first
//! differences of a value stream. The engine instantiates it twice:
//!
//! 1. **Index Delta Table** — deltas of the *values loaded* by candidate
//!    index PCs (fed from response events).
//! 2. **Target Delta Table** — deltas of the *addresses accessed* by
//!    candidate target PCs (fed from request events).
//!
//! Both live in the same signed 64-bit domain so a loaded index value and a
//! byte address can be compared after shifting. Each entry owns a fixed
//! ring: deltas grow the ring until capacity, then overwrite the oldest via
//! a moving head. An entry becomes `ready` on the fill that first reaches
//! capacity and stays ready until its slot is reallocated.

use crate::common::{ContextId, Pc};

/// One tracked PC's running difference sequence.
#[derive(Debug, Clone)]
pub struct DeltaEntry {
    pc: Pc,
    context: ContextId,
    last_value: i64,
    /// Delta storage; logical order starts at `head` once full.
    ring: Vec<i64>,
    head: usize,
    ready: bool,
    valid: bool,
}

impl DeltaEntry {
    fn new(capacity: usize) -> Self {
        Self {
            pc: 0,
            context: 0,
            last_value: 0,
            ring: Vec::with_capacity(capacity),
            head: 0,
            ready: false,
            valid: false,
        }
    }

    /// Resets the slot for a new PC, clearing the ring and flags.
    fn renew(&mut self, pc: Pc, context: ContextId) {
        self.pc = pc;
        self.context = context;
        self.last_value = 0;
        self.ring.clear();
        self.head = 0;
        self.ready = false;
        self.valid = true;
    }

    /// PC this entry tracks.
    pub fn pc(&self) -> Pc {
        self.pc
    }

    /// Context this entry was allocated in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Most recent raw value fed to the entry.
    pub fn last_value(&self) -> i64 {
        self.last_value
    }

    /// Number of deltas currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// True when no delta has been recorded since allocation.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// The `i`-th stored delta in arrival order (0 = oldest).
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn delta(&self, i: usize) -> i64 {
        self.ring[(self.head + i) % self.ring.len()]
    }

    /// True once the ring has reached capacity at least once.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True while the slot is allocated to a PC.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Records `new_value`, pushing its delta from the previous value.
    ///
    /// A context mismatch is a deliberate silent no-op: a slot never mixes
    /// deltas from unrelated execution streams.
    fn fill(&mut self, new_value: i64, context: ContextId, capacity: usize) {
        if context != self.context {
            return;
        }
        let delta = new_value.wrapping_sub(self.last_value);
        if self.ring.len() < capacity {
            self.ring.push(delta);
            if self.ring.len() == capacity {
                self.ready = true;
            }
        } else {
            self.ring[self.head] = delta;
            self.head = (self.head + 1) % capacity;
        }
        self.last_value = new_value;
    }
}

/// Fixed-capacity, round-robin table of delta sequences.
#[derive(Debug)]
pub struct DeltaTable {
    entries: Vec<DeltaEntry>,
    cursor: usize,
    diff_num: usize,
}

impl DeltaTable {
    /// Creates a table of `capacity` slots whose rings hold `diff_num`
    /// deltas each.
    pub fn new(capacity: usize, diff_num: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| DeltaEntry::new(diff_num)).collect(),
            cursor: 0,
            diff_num,
        }
    }

    /// Registers `pc`, claiming the next round-robin slot.
    ///
    /// A PC already tracked keeps its slot and state; re-registration is a
    /// no-op so repeated picks of the same candidate do not discard an
    /// in-progress sequence.
    pub fn allocate(&mut self, pc: Pc, context: ContextId) {
        if self.entries.iter().any(|e| e.valid && e.pc == pc) {
            return;
        }
        self.entries[self.cursor].renew(pc, context);
        self.cursor = (self.cursor + 1) % self.entries.len();
    }

    /// Number of slots (valid or not).
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Borrows the entry in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= self.slot_count()`.
    pub fn entry(&self, slot: usize) -> &DeltaEntry {
        &self.entries[slot]
    }

    /// All slots, for scanning.
    pub fn entries(&self) -> &[DeltaEntry] {
        &self.entries
    }

    /// Ring capacity of every entry in this table.
    pub fn diff_num(&self) -> usize {
        self.diff_num
    }

    /// Feeds `value` to the entry in `slot`.
    ///
    /// Returns true when the fill was applied and the entry is ready, the
    /// condition under which the matcher runs. Context mismatches and
    /// invalid slots return false without mutating anything.
    pub fn fill_at(&mut self, slot: usize, value: i64, context: ContextId) -> bool {
        let diff_num = self.diff_num;
        let entry = &mut self.entries[slot];
        if !entry.valid || entry.context != context {
            return false;
        }
        entry.fill(value, context, diff_num);
        entry.ready
    }
}
