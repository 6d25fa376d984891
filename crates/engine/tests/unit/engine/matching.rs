//! Matching Engine Tests.
//!
//! Verifies sliding-window comparison across shift amounts, hit
//! reporting, and base recovery from the matched window position.

use ixfetch_core::engine::delta::DeltaTable;
use ixfetch_core::engine::matcher::{self, MatchHit};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Builds a one-slot table for `pc` and feeds `values` into it.
fn fed_table(pc: u64, values: &[i64], diff_num: usize) -> DeltaTable {
    let mut table = DeltaTable::new(1, diff_num);
    table.allocate(pc, 0);
    for &value in values {
        let _ = table.fill_at(0, value, 0);
    }
    table
}

// ══════════════════════════════════════════════════════════
// 1. Window comparison
// ══════════════════════════════════════════════════════════

/// Equal delta sequences match at shift zero, once each ring has cycled
/// past its seed delta.
#[test]
fn equal_sequences_match_at_shift_zero() {
    // Index values 10, 11, 13, 16 → window [1, 2, 3] after four fills.
    let indices = fed_table(0x400, &[10, 11, 13, 16], 3);
    // Target addresses 2000, 2001, 2003, 2006 → the same window.
    let targets = fed_table(0x900, &[2000, 2001, 2003, 2006], 3);

    let hits = matcher::scan(&indices, targets.entry(0), &[0, 1]);
    assert_eq!(
        hits,
        vec![MatchHit {
            index_slot: 0,
            shift: 0,
            match_point: 3,
        }]
    );
}

/// A target stream scaled by 2^s matches exactly at shift s.
#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
fn scaled_stream_matches_at_its_shift(#[case] shift: u32) {
    let indices = fed_table(0x400, &[0, 3, 6, 9], 3);
    let step = 3_i64 << shift;
    let targets = fed_table(
        0x900,
        &[0x1000, 0x1000 + step, 0x1000 + 2 * step, 0x1000 + 3 * step],
        3,
    );

    let hits = matcher::scan(&indices, targets.entry(0), &[0, 1, 2, 3]);
    assert_eq!(hits.len(), 1, "exactly one window should match");
    assert_eq!(hits[0].shift, shift);
}

/// Negative index steps match negative address steps under arithmetic
/// shifting.
#[test]
fn descending_streams_match() {
    // Index walks down by 16, target by 64: 64 >> 2 == 16 holds for the
    // negative deltas as well.
    let indices = fed_table(0x400, &[1000, 984, 968, 952], 3);
    let targets = fed_table(0x900, &[0x2000, 0x2000 - 64, 0x2000 - 128, 0x2000 - 192], 3);

    let hits = matcher::scan(&indices, targets.entry(0), &[2]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].shift, 2);
}

/// The target window is matched at every offset inside a longer index
/// sequence, and the hit records where the window ended.
#[test]
fn window_slides_inside_longer_index() {
    // Index values 0, 1, 2, 99, 109, 119 → window [1, 1, 97, 10, 10].
    let indices = fed_table(0x400, &[0, 1, 2, 99, 109, 119], 5);
    // Target addresses 500, 501, 598, 608 → window [1, 97, 10], matching
    // at offset 1.
    let targets = fed_table(0x900, &[500, 501, 598, 608], 3);

    let hits = matcher::scan(&indices, targets.entry(0), &[0]);
    assert_eq!(
        hits,
        vec![MatchHit {
            index_slot: 0,
            shift: 0,
            match_point: 4,
        }]
    );
}

/// Distinct index entries can both hit; the scan reports each one.
#[test]
fn every_matching_index_is_reported() {
    let mut indices = DeltaTable::new(2, 3);
    indices.allocate(0x400, 0);
    indices.allocate(0x500, 0);
    for &value in &[0, 3, 6, 9] {
        let _ = indices.fill_at(0, value, 0);
        let _ = indices.fill_at(1, value, 0);
    }
    let targets = fed_table(0x900, &[0, 3, 6, 9], 3);

    let hits = matcher::scan(&indices, targets.entry(0), &[0]);
    let slots: Vec<usize> = hits.iter().map(|h| h.index_slot).collect();
    assert_eq!(slots, vec![0, 1]);
}

// ══════════════════════════════════════════════════════════
// 2. Exclusions
// ══════════════════════════════════════════════════════════

/// Index sequences that never reached capacity are skipped.
#[test]
fn unready_index_is_skipped() {
    let indices = fed_table(0x400, &[0, 3], 3);
    let targets = fed_table(0x900, &[0, 3, 6, 9], 3);

    assert!(matcher::scan(&indices, targets.entry(0), &[0]).is_empty());
}

/// Sequences from different contexts never match.
#[test]
fn context_mismatch_never_matches() {
    let mut indices = DeltaTable::new(1, 3);
    indices.allocate(0x400, 1);
    for &value in &[0, 3, 6, 9] {
        let _ = indices.fill_at(0, value, 1);
    }
    let targets = fed_table(0x900, &[0, 3, 6, 9], 3);

    assert!(matcher::scan(&indices, targets.entry(0), &[0]).is_empty());
}

/// A target window longer than the index sequence cannot slide inside it.
#[test]
fn target_longer_than_index_is_skipped() {
    let indices = fed_table(0x400, &[0, 3, 6], 2);
    let targets = fed_table(0x900, &[0, 3, 6, 9], 3);

    assert!(matcher::scan(&indices, targets.entry(0), &[0]).is_empty());
}

// ══════════════════════════════════════════════════════════
// 3. Base recovery
// ══════════════════════════════════════════════════════════

/// With the match at the end of the index sequence, the base is simply
/// the target's last address minus the scaled last value.
#[test]
fn base_from_match_at_sequence_end() {
    let indices = fed_table(0x400, &[10, 11, 12, 13], 3);
    // target_last = 1012, index value at the window end = 13, shift 2:
    // base = 1012 - (13 << 2) = 960.
    assert_eq!(matcher::recover_base(indices.entry(0), 3, 1012, 2), 960);
}

/// Deltas recorded after the match point are walked back off the last
/// raw value before scaling.
#[test]
fn base_rewinds_trailing_deltas() {
    // Window [1, 1, 97, 10, 10], last value 119. A match point of 4
    // leaves one trailing delta (10), so the window ended on 109.
    let indices = fed_table(0x400, &[0, 1, 2, 99, 109, 119], 5);
    assert_eq!(matcher::recover_base(indices.entry(0), 4, 608, 0), 499);
}
