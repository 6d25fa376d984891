//! Sliding-window delta matching.
//!
//! Whenever a target PC's delta sequence is fully populated, the matcher
//! slides it across every ready index sequence in the same context, at
//! every shift in the configured set, looking for a window where each
//! target delta equals the corresponding index delta scaled up by the
//! shift. In the signed delta domain that comparison is
//! `index_delta == target_delta >> shift` (arithmetic shift), so negative
//! index steps match negative address steps.
//!
//! Each hit records where the window ended; from there the index value "as
//! of the match point" is recovered by walking the trailing deltas back off
//! the sequence's last raw value, which pins down the base-address
//! correction for the relation.

use super::delta::{DeltaEntry, DeltaTable};

/// One successful window comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchHit {
    /// Slot of the matching index entry in the Index Delta Table.
    pub index_slot: usize,
    /// Shift the window matched at.
    pub shift: u32,
    /// Index-sequence position one past the matched window.
    pub match_point: usize,
}

/// Scans every ready index sequence for windows matching `target`.
///
/// All hits are returned — a later duplicate is cheaper to reject at
/// insertion than to suppress here, and distinct shifts can legitimately
/// match the same pair.
pub fn scan(indices: &DeltaTable, target: &DeltaEntry, shifts: &[u32]) -> Vec<MatchHit> {
    let mut hits = Vec::new();
    let target_len = target.len();

    for (index_slot, index) in indices.entries().iter().enumerate() {
        if !index.is_valid() || !index.is_ready() || index.context() != target.context() {
            continue;
        }
        let index_len = index.len();
        if target_len > index_len {
            continue;
        }
        for i_start in 0..=(index_len - target_len) {
            for &shift in shifts {
                if window_matches(index, i_start, target, shift) {
                    hits.push(MatchHit {
                        index_slot,
                        shift,
                        match_point: i_start + target_len,
                    });
                }
            }
        }
    }
    hits
}

/// Compares the full target window against the index window at `i_start`.
fn window_matches(index: &DeltaEntry, i_start: usize, target: &DeltaEntry, shift: u32) -> bool {
    (0..target.len()).all(|k| index.delta(i_start + k) == target.delta(k) >> shift)
}

/// Recovers the base-address correction for a hit.
///
/// Subtracting the index deltas recorded after `match_point` from the
/// sequence's last raw value yields the index value the matched window
/// ended on; scaling it by the shift and subtracting from the target's
/// last address gives the base.
pub fn recover_base(index: &DeltaEntry, match_point: usize, target_last: i64, shift: u32) -> i64 {
    let mut value = index.last_value();
    for k in match_point..index.len() {
        value = value.wrapping_sub(index.delta(k));
    }
    target_last.wrapping_sub(value.wrapping_shl(shift))
}
