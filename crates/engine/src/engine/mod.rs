//! The indirect-access pattern engine.
//!
//! This module owns the correlation tables and wires them to the host's
//! event callbacks. The moving parts:
//! 1. **Delta tables** ([`delta`]) — per-PC difference sequences for loaded
//!    values (index side) and accessed addresses (target side).
//! 2. **Range classifier** ([`range`]) — continuity sampling that both
//!    filters target fills and marks relations as range-type.
//! 3. **Discovery pipeline** ([`queue`], [`scoreboard`]) — candidate index
//!    PCs are seeded from classified accesses, periodically picked by
//!    weight, and their correlated miss PCs promoted to targets.
//! 4. **Matcher** ([`matcher`]) — sliding-window, multi-shift comparison of
//!    target windows against every ready index sequence.
//! 5. **Relation table** ([`relation`]) — the confirmed correlation store.
//! 6. **Generator** ([`generate`]) — turns fills for index PCs into
//!    prioritized prefetch candidates.
//!
//! Everything is synchronous and singly owned: each callback mutates the
//! tables in event order and returns, and the table invariants hold again
//! by the time it does. The only notion of time is the host-driven
//! [`PatternEngine::tick`], which services the recurring index-pick
//! deadline.

use std::fmt;

use tracing::{debug, trace};

use crate::common::{ConfigError, Tick, WORD_BYTES};
use crate::config::EngineConfig;
use crate::event::{
    AccessEvent, FillEvent, PrefetchCandidate, QueueFilter, RequestEvent, ResponseEvent,
};
use crate::stats::EngineStats;
use crate::stride::{StrideClassifier, TableStrideClassifier};

/// Delta-Sequence Tables (rings of first differences).
pub mod delta;
/// Prefetch address generation from fill data.
pub mod generate;
/// Sliding-window, multi-shift delta matching.
pub mod matcher;
/// Index Candidate Queue and weighted picker.
pub mod queue;
/// Range Classifier Table (continuity sampling).
pub mod range;
/// Relation Table (confirmed correlations).
pub mod relation;
/// Indirect Candidate Scoreboard (miss counting and promotion).
pub mod scoreboard;

use self::delta::DeltaTable;
use self::queue::IndexQueue;
use self::range::RangeTable;
use self::relation::{InsertOutcome, NewRelation, RelationTable};
use self::scoreboard::Scoreboard;

/// PCs with this bit set live in the kernel half of the canonical address
/// space and never seed discovery.
const KERNEL_HALF: u64 = 0x8000_0000_0000_0000;

/// The engine: all tables, the discovery timer, and the stride companion.
///
/// Construct with [`PatternEngine::new`], deliver events through the
/// `on_*` callbacks in simulation order, and call
/// [`PatternEngine::tick`] as simulated time advances.
pub struct PatternEngine {
    config: EngineConfig,
    indices: DeltaTable,
    targets: DeltaTable,
    ranges: RangeTable,
    queue: IndexQueue,
    scoreboard: Scoreboard,
    relations: RelationTable,
    classifier: Box<dyn StrideClassifier>,
    stats: EngineStats,
    /// Deadline of the next index pick; `None` until the first tick in
    /// auto-detect mode, always `None` in manual mode.
    next_pick_at: Option<Tick>,
}

impl PatternEngine {
    /// Builds an engine with the crate's table-based stride classifier.
    ///
    /// # Errors
    ///
    /// Returns any [`ConfigError`] raised by
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let classifier = Box::new(TableStrideClassifier::new(
            config.index_table_size,
            config.block_size,
            1,
        ));
        Self::with_classifier(config, classifier)
    }

    /// Builds an engine with a host-supplied stride classifier.
    ///
    /// # Errors
    ///
    /// Returns any [`ConfigError`] raised by
    /// [`EngineConfig::validate`].
    pub fn with_classifier(
        config: EngineConfig,
        classifier: Box<dyn StrideClassifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut indices = DeltaTable::new(config.index_table_size, config.index_diff_num);
        let mut targets = DeltaTable::new(config.target_table_size, config.target_diff_num);
        let mut ranges = RangeTable::new(
            config.range_table_size,
            &config.shift_set,
            config.range_unit,
            config.range_levels,
        );
        let mut stats = EngineStats::new();

        if !config.auto_detect {
            for &pc in &config.index_seeds {
                indices.allocate(pc, 0);
            }
            for &pc in &config.target_seeds {
                targets.allocate(pc, 0);
                stats.track_pc(pc);
            }
            for &pc in &config.range_seeds {
                ranges.register(pc, 0, 0);
            }
        }

        Ok(Self {
            queue: IndexQueue::new(config.index_queue_size),
            scoreboard: Scoreboard::new(
                config.scoreboard_size,
                config.candidate_num,
                config.miss_threshold,
            ),
            relations: RelationTable::new(
                config.relation_table_size,
                config.block_size,
                config.range_group_size,
            ),
            config,
            indices,
            targets,
            ranges,
            classifier,
            stats,
            next_pick_at: None,
        })
    }

    /// An outgoing load request observed below the first private cache
    /// level: feeds the target-side delta sequence for the requesting PC
    /// and runs the matcher once the sequence is populated.
    ///
    /// Requests without a PC or virtual address are dropped, as are
    /// addresses that would overflow the signed delta domain.
    pub fn on_request(&mut self, ev: &RequestEvent) {
        let (Some(pc), Some(vaddr)) = (ev.pc, ev.vaddr) else {
            self.stats.events_incomplete += 1;
            return;
        };
        if vaddr > i64::MAX as u64 {
            self.stats.values_out_of_range += 1;
            return;
        }
        let context = ev.context.unwrap_or(0);
        let value = vaddr as i64;

        for slot in 0..self.targets.slot_count() {
            let entry = self.targets.entry(slot);
            if !entry.is_valid() || entry.pc() != pc {
                continue;
            }
            // A repeated address is a re-read, not a stream step.
            if entry.last_value() == value {
                continue;
            }
            if !self.ranges.filter(pc, vaddr, context) {
                self.stats.range_filtered += 1;
                continue;
            }
            trace!(pc, vaddr, "target address observed");
            if self.targets.fill_at(slot, value, context) {
                self.match_target(slot);
            }
        }
    }

    /// A data response observed below the first private cache level: feeds
    /// the index-side delta sequence for the loading PC.
    ///
    /// The loaded value is the payload's first word, sign-extended into the
    /// delta domain. Responses without a PC or a full word of data are
    /// dropped.
    pub fn on_response(&mut self, ev: &ResponseEvent<'_>) {
        let Some(pc) = ev.pc else {
            self.stats.events_incomplete += 1;
            return;
        };
        let Some(data) = ev.data.filter(|d| d.len() >= WORD_BYTES) else {
            self.stats.events_incomplete += 1;
            return;
        };
        let context = ev.context.unwrap_or(0);
        let value = i64::from(i32::from_le_bytes([data[0], data[1], data[2], data[3]]));

        for slot in 0..self.indices.slot_count() {
            let entry = self.indices.entry(slot);
            if !entry.is_valid() || entry.pc() != pc {
                continue;
            }
            if entry.last_value() == value {
                continue;
            }
            trace!(pc, value, "index value observed");
            let _ = self.indices.fill_at(slot, value, context);
        }
    }

    /// A cache-line fill or hit with its data: generates prefetch
    /// candidates for every relation whose index PC produced it.
    ///
    /// Returns the deduplicated, prioritized candidates for the host to
    /// translate and issue.
    pub fn on_fill(
        &mut self,
        ev: &FillEvent<'_>,
        queues: &dyn QueueFilter,
    ) -> Vec<PrefetchCandidate> {
        let Some(pc) = ev.pc else {
            self.stats.events_incomplete += 1;
            return Vec::new();
        };
        let Some(data) = ev.data else {
            self.stats.fills_unusable += 1;
            return Vec::new();
        };
        generate::run(
            &self.relations,
            pc,
            ev.paddr,
            data,
            self.config.block_size,
            queues,
            &mut self.stats,
        )
    }

    /// A classified first-level access: offers the access to the stride
    /// companion (returning its fallback candidates), counts misses on the
    /// scoreboard, and seeds the index queue.
    ///
    /// In manual mode only the stride fallback runs.
    pub fn on_access(&mut self, ev: &AccessEvent) -> Vec<PrefetchCandidate> {
        let Some(pc) = ev.pc else {
            self.stats.events_incomplete += 1;
            return Vec::new();
        };
        let context = ev.context.unwrap_or(0);

        let candidates: Vec<PrefetchCandidate> = self
            .classifier
            .observe(pc, ev.vaddr, context)
            .into_iter()
            .map(|addr| PrefetchCandidate {
                addr,
                pc,
                context,
                priority: 0,
            })
            .collect();

        if self.config.auto_detect {
            if ev.is_miss && self.scoreboard.note_miss(pc, context) {
                self.stats.promotions += 1;
                debug!(pc, context, "promoted to target");
                self.targets.allocate(pc, context);
                self.ranges.register(pc, context, ev.vaddr);
            }
            if pc & KERNEL_HALF == 0 {
                self.queue.insert(pc, context);
            }
        }
        candidates
    }

    /// Advances the discovery timer to `now`.
    ///
    /// The first tick in auto-detect mode arms the recurring index-pick
    /// deadline; each later tick at or past the deadline picks the best
    /// queue candidate and re-arms. Deadlines never back up: at most one
    /// pick fires per call. Manual mode never arms the timer.
    pub fn tick(&mut self, now: Tick) {
        if !self.config.auto_detect {
            return;
        }
        match self.next_pick_at {
            None => {
                let deadline = now + self.config.detect_period;
                debug!(deadline, "discovery timer armed");
                self.next_pick_at = Some(deadline);
            }
            Some(deadline) if now >= deadline => {
                self.pick_index();
                self.next_pick_at = Some(now + self.config.detect_period);
            }
            Some(_) => {}
        }
    }

    /// Picks the best index candidate and opens observation on it.
    fn pick_index(&mut self) {
        let Some((pc, context)) = self.queue.pick() else {
            return;
        };
        self.stats.index_picks += 1;
        debug!(pc, context, "index candidate selected");
        self.scoreboard.register(pc, context);
        self.indices.allocate(pc, context);
    }

    /// Runs the matcher for the populated target sequence in `slot` and
    /// processes every hit: queue feedback, chain re-seeding, range
    /// classification, and relation insertion.
    fn match_target(&mut self, slot: usize) {
        let hits = matcher::scan(
            &self.indices,
            self.targets.entry(slot),
            &self.config.shift_set,
        );

        for hit in hits {
            let (index_pc, target_pc, context, base) = {
                let index = self.indices.entry(hit.index_slot);
                let target = self.targets.entry(slot);
                (
                    index.pc(),
                    target.pc(),
                    target.context(),
                    matcher::recover_base(index, hit.match_point, target.last_value(), hit.shift),
                )
            };
            self.stats.matches_found += 1;
            debug!(
                index_pc,
                target_pc,
                shift = hit.shift,
                base,
                "delta sequences matched"
            );

            // Match feedback: raise the index candidate's weight and seed
            // the target as a candidate of its own, so A→B→C chains are
            // discovered hop by hop.
            self.queue.credit_match(index_pc, context);
            self.queue.insert(target_pc, context);

            let range = self.classifier.is_regular(index_pc, context)
                || self.ranges.has_observed_runs(index_pc, context);
            let outcome = self.relations.insert(NewRelation {
                index_pc,
                target_pc,
                base,
                shift: hit.shift,
                range,
                range_degree: self.config.range_degree,
                context,
            });
            match outcome {
                InsertOutcome::Inserted | InsertOutcome::Updated => {
                    trace!(index_pc, target_pc, ?outcome, "relation recorded");
                    self.stats.relations_inserted += 1;
                }
                InsertOutcome::Rejected => {
                    trace!(index_pc, target_pc, "relation rejected");
                    self.stats.relations_rejected += 1;
                }
            }
        }
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Observability counters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Read-only view of the confirmed relations.
    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    /// Read-only view of the discovery candidate queue.
    pub fn index_queue(&self) -> &IndexQueue {
        &self.queue
    }
}

impl fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternEngine")
            .field("auto_detect", &self.config.auto_detect)
            .field("next_pick_at", &self.next_pick_at)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
