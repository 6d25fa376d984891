//! Engine statistics collection and reporting.
//!
//! This module tracks observability counters for the pattern engine. It
//! provides:
//! 1. **Candidate flow:** Candidates identified, suppressed by queue dedup,
//!    and a bounded per-PC breakdown.
//! 2. **Discovery pipeline:** Index picks, scoreboard promotions, matches,
//!    and relation insert/reject counts.
//! 3. **Drop accounting:** Incomplete events, out-of-range values, unusable
//!    fill data, and range-filter suppressions.
//!
//! Counters never affect engine behavior; they exist so a host can report
//! them alongside its own simulation statistics.

use std::collections::HashMap;

use crate::common::Pc;

/// Cap on individually tracked PCs in the per-PC candidate breakdown.
/// Further PCs are counted in the aggregate only.
const MAX_TRACKED_PCS: usize = 64;

/// Observability counters, updated synchronously by every callback.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Indirect prefetch candidates handed to the collaborator.
    pub candidates_identified: u64,
    /// Candidates suppressed because an outstanding queue already held the
    /// predicted line.
    pub candidates_in_flight: u64,
    /// Fill events whose data was missing or too short to extract a word
    /// for any matching relation.
    pub fills_unusable: u64,
    /// Events dropped for lacking a required attribute (PC, address, data).
    pub events_incomplete: u64,
    /// Values dropped because they would overflow the signed delta domain.
    pub values_out_of_range: u64,
    /// Target fills suppressed by the range classifier (re-read or run
    /// continuation).
    pub range_filtered: u64,
    /// Successful sliding-window matches.
    pub matches_found: u64,
    /// Relation entries inserted or refreshed in place.
    pub relations_inserted: u64,
    /// Relation candidates rejected by the duplicate, cycle, or redundancy
    /// rules.
    pub relations_rejected: u64,
    /// Scoreboard candidates promoted to target status.
    pub promotions: u64,
    /// Index-pick callbacks that selected a candidate.
    pub index_picks: u64,

    per_pc: HashMap<Pc, u64>,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"discovery"`, `"drops"`,
/// `"per_pc"`. Pass an empty slice to `print_sections` to print all
/// sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "discovery", "drops", "per_pc"];

impl EngineStats {
    /// Creates a zeroed statistics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one identified candidate attributed to `pc`.
    pub fn record_candidate(&mut self, pc: Pc) {
        self.candidates_identified += 1;
        if let Some(count) = self.per_pc.get_mut(&pc) {
            *count += 1;
        } else if self.per_pc.len() < MAX_TRACKED_PCS {
            let _ = self.per_pc.insert(pc, 1);
        }
    }

    /// Reserves a per-PC slot for `pc` ahead of time, so manually seeded
    /// PCs appear in the breakdown even before their first candidate.
    pub fn track_pc(&mut self, pc: Pc) {
        if self.per_pc.contains_key(&pc) || self.per_pc.len() < MAX_TRACKED_PCS {
            let _ = self.per_pc.entry(pc).or_insert(0);
        }
    }

    /// Per-PC breakdown of candidates identified (bounded; see
    /// [`Self::record_candidate`]).
    pub fn per_pc_candidates(&self) -> &HashMap<Pc, u64> {
        &self.per_pc
    }

    /// Prints the requested sections to stdout.
    ///
    /// Recognized names are `"summary"`, `"discovery"`, `"drops"`,
    /// `"per_pc"`, and `"all"`; an empty list prints everything.
    pub fn print_sections(&self, sections: &[String]) {
        let enabled =
            |name: &str| sections.is_empty() || sections.iter().any(|s| s == name || s == "all");

        if enabled("summary") {
            println!("\n==========================================================");
            println!("INDIRECT PREFETCH ENGINE STATISTICS");
            println!("==========================================================");
            println!("pf_identified            {}", self.candidates_identified);
            println!("pf_in_flight             {}", self.candidates_in_flight);
            println!("----------------------------------------------------------");
        }

        if enabled("discovery") {
            println!("DISCOVERY PIPELINE");
            println!("  index_picks            {}", self.index_picks);
            println!("  promotions             {}", self.promotions);
            println!("  matches_found          {}", self.matches_found);
            println!("  relations_inserted     {}", self.relations_inserted);
            println!("  relations_rejected     {}", self.relations_rejected);
            println!("----------------------------------------------------------");
        }

        if enabled("drops") {
            println!("DROPPED INPUT");
            println!("  events_incomplete      {}", self.events_incomplete);
            println!("  values_out_of_range    {}", self.values_out_of_range);
            println!("  fills_unusable         {}", self.fills_unusable);
            println!("  range_filtered         {}", self.range_filtered);
            println!("----------------------------------------------------------");
        }

        if enabled("per_pc") && !self.per_pc.is_empty() {
            println!("CANDIDATES BY PC");
            let mut rows: Vec<(Pc, u64)> = self.per_pc.iter().map(|(&pc, &n)| (pc, n)).collect();
            rows.sort_unstable();
            for (pc, count) in rows {
                println!("  {pc:#018x}     {count}");
            }
            println!("----------------------------------------------------------");
        }
    }
}
