//! Range Classifier Table.
//!
//! Decides whether a target PC's accesses form contiguous range scans.
//! Every tracked PC owns one entry per shift amount; an entry shifts each
//! sampled address right by its shift (turning a byte address into an
//! access-granularity element index) and watches for runs of consecutive
//! indices. Completed runs are quantized into a small histogram, and any
//! recorded run marks the PC as range-type for relation classification.
//!
//! Sampling doubles as an input filter for the Target Delta Table: a sample
//! that merely repeats a recent address or extends the current run carries
//! no new pattern information, so the corresponding address fill is
//! suppressed.

use tracing::trace;

use crate::common::{Addr, ContextId, Pc};

/// What a sampled address meant to one range entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Duplicate of one of the last two sampled addresses; a re-read.
    Filtered,
    /// Extends the current contiguous run.
    Continues,
    /// Breaks contiguity and starts a new access run.
    Starts,
}

/// Continuity sampler for one (PC, shift) pair.
#[derive(Debug, Clone)]
pub struct RangeEntry {
    pc: Pc,
    context: ContextId,
    shift: u32,
    /// Last two shifted addresses, for re-read suppression.
    last_two: [u64; 2],
    /// Shifted address at the tail of the current run.
    tail: u64,
    /// Consecutive extensions recorded in the current run.
    run_length: u64,
    /// Completed-run lengths, quantized into `unit`-sized buckets.
    histogram: Vec<u64>,
    valid: bool,
}

impl RangeEntry {
    fn new(levels: usize) -> Self {
        Self {
            pc: 0,
            context: 0,
            shift: 0,
            last_two: [0; 2],
            tail: 0,
            run_length: 0,
            histogram: vec![0; levels],
            valid: false,
        }
    }

    fn renew(&mut self, pc: Pc, context: ContextId, shift: u32, seed_addr: Addr) {
        let shifted = seed_addr >> shift;
        self.pc = pc;
        self.context = context;
        self.shift = shift;
        self.last_two = [shifted; 2];
        self.tail = shifted;
        self.run_length = 0;
        self.histogram.fill(0);
        self.valid = true;
    }

    /// PC this entry samples.
    pub fn pc(&self) -> Pc {
        self.pc
    }

    /// Context this entry was registered in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Shift applied to sampled addresses.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// True while the slot is allocated.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Completed-run histogram, oldest bucket first.
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// True iff any contiguous run has ever completed at this granularity.
    pub fn has_observed_runs(&self) -> bool {
        self.histogram.iter().any(|&count| count > 0)
    }

    /// Samples one address.
    ///
    /// A duplicate of either of the last two shifted addresses is
    /// [`SampleOutcome::Filtered`]. An address one past the current tail
    /// extends the run ([`SampleOutcome::Continues`]). Anything else closes
    /// the run — quantizing a non-empty run length into
    /// `min(levels, ceil(run / unit))` and bumping that bucket — and starts
    /// a new one ([`SampleOutcome::Starts`]).
    pub fn sample(&mut self, addr: Addr, unit: u64) -> SampleOutcome {
        let shifted = addr >> self.shift;
        if shifted == self.last_two[0] || shifted == self.last_two[1] {
            return SampleOutcome::Filtered;
        }
        self.last_two[0] = self.last_two[1];
        self.last_two[1] = shifted;

        if shifted == self.tail.wrapping_add(1) {
            self.tail = shifted;
            self.run_length += 1;
            return SampleOutcome::Continues;
        }

        if self.run_length > 0 {
            let bucket = (self.run_length.div_ceil(unit) as usize).min(self.histogram.len());
            self.histogram[bucket - 1] += 1;
        }
        self.tail = shifted;
        self.run_length = 0;
        SampleOutcome::Starts
    }
}

/// Fixed-capacity table of range entries, one per (PC, shift).
#[derive(Debug)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
    cursor: usize,
    shifts: Vec<u32>,
    unit: u64,
    levels: usize,
}

impl RangeTable {
    /// Creates a table tracking up to `capacity` PCs across `shifts`.
    ///
    /// The physical table holds `capacity * shifts.len()` entries so a
    /// registration always finds a full group of slots.
    pub fn new(capacity: usize, shifts: &[u32], unit: u64, levels: usize) -> Self {
        let physical = capacity * shifts.len();
        Self {
            entries: (0..physical).map(|_| RangeEntry::new(levels)).collect(),
            cursor: 0,
            shifts: shifts.to_vec(),
            unit,
            levels,
        }
    }

    /// Registers `pc`, allocating one entry per shift seeded at
    /// `seed_addr`. A PC already tracked in `context` keeps its entries.
    pub fn register(&mut self, pc: Pc, context: ContextId, seed_addr: Addr) {
        if self
            .entries
            .iter()
            .any(|e| e.valid && e.pc == pc && e.context == context)
        {
            return;
        }
        let shifts = self.shifts.clone();
        for shift in shifts {
            self.entries[self.cursor].renew(pc, context, shift, seed_addr);
            self.cursor = (self.cursor + 1) % self.entries.len();
        }
    }

    /// Samples `addr` through every entry registered for `(pc, context)`
    /// and reports whether the access should propagate downstream.
    ///
    /// Propagation requires every granularity to judge the sample a new
    /// access: one entry seeing a re-read or a run continuation is enough
    /// to suppress it. A PC with no entries always propagates.
    pub fn filter(&mut self, pc: Pc, addr: Addr, context: ContextId) -> bool {
        let unit = self.unit;
        let mut propagate = true;
        for entry in &mut self.entries {
            if !entry.valid || entry.pc != pc || entry.context != context {
                continue;
            }
            let outcome = entry.sample(addr, unit);
            trace!(pc, addr, shift = entry.shift, ?outcome, "range sample");
            propagate &= outcome == SampleOutcome::Starts;
        }
        propagate
    }

    /// True when any entry for `(pc, context)` has recorded a completed
    /// run — the range-type signal consumed by relation classification.
    pub fn has_observed_runs(&self, pc: Pc, context: ContextId) -> bool {
        self.entries
            .iter()
            .any(|e| e.valid && e.pc == pc && e.context == context && e.has_observed_runs())
    }

    /// All slots, for scanning.
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// Histogram bucket count configured for every entry.
    pub fn levels(&self) -> usize {
        self.levels
    }
}
