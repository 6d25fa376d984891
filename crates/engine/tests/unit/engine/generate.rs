//! Prefetch Address Generation Tests.
//!
//! Verifies word extraction from fill data, the range read-ahead window
//! and its clamps, address reconstruction, in-flight deduplication, and
//! the unusable-fill accounting.

use crate::common::mocks::host::MockQueues;
use ixfetch_core::engine::generate;
use ixfetch_core::engine::relation::{NewRelation, RelationTable};
use ixfetch_core::stats::EngineStats;
use ixfetch_core::{NoOutstanding, Pc, PrefetchCandidate};
use pretty_assertions::assert_eq;

const BLOCK: u64 = 64;

/// A relation table holding one edge from `index_pc`.
fn table_with_edge(index_pc: Pc, target_pc: Pc, base: i64, range: bool) -> RelationTable {
    let mut table = RelationTable::new(4, BLOCK, 64);
    let _ = table.insert(NewRelation {
        index_pc,
        target_pc,
        base,
        shift: 2,
        range,
        range_degree: 4,
        context: 0,
    });
    table
}

/// Lays out little-endian words at the front of a zeroed block.
fn block_of_words(words: &[u32]) -> Vec<u8> {
    let mut data = vec![0_u8; BLOCK as usize];
    for (i, word) in words.iter().enumerate() {
        data[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    data
}

// ══════════════════════════════════════════════════════════
// 1. Single-access extraction
// ══════════════════════════════════════════════════════════

/// A single-access relation reads exactly the word at the access offset
/// and reconstructs the aligned target line.
#[test]
fn single_access_extracts_word_at_offset() {
    let table = table_with_edge(0x400, 0x900, 0x100, false);
    let mut stats = EngineStats::new();
    // Words 0..4 live at offsets 0, 4, 8, 12; the access hits offset 8.
    let data = block_of_words(&[0x11, 0x22, 0x40, 0x44]);

    let out = generate::run(
        &table,
        0x400,
        0x5008,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );

    // (0x40 << 2) + 0x100 = 0x200, already line-aligned.
    assert_eq!(
        out,
        vec![PrefetchCandidate {
            addr: 0x200,
            pc: 0x900,
            context: 0,
            priority: 0,
        }]
    );
    assert_eq!(stats.candidates_identified, 1);
    assert_eq!(stats.per_pc_candidates().get(&0x900), Some(&1));
}

/// A fill for a PC with no relations produces nothing and counts nothing.
#[test]
fn unrelated_pc_generates_nothing() {
    let table = table_with_edge(0x400, 0x900, 0x100, false);
    let mut stats = EngineStats::new();
    let data = block_of_words(&[0x11]);

    let out = generate::run(
        &table,
        0xDEAD,
        0x5000,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );
    assert!(out.is_empty());
    assert_eq!(stats.candidates_identified, 0);
    assert_eq!(stats.fills_unusable, 0);
}

// ══════════════════════════════════════════════════════════
// 2. Range read-ahead
// ══════════════════════════════════════════════════════════

/// A range relation reads `range_degree` consecutive words, each carrying
/// the shared range priority.
#[test]
fn range_relation_reads_degree_words() {
    let table = table_with_edge(0x400, 0x900, 0, true);
    let mut stats = EngineStats::new();
    let data = block_of_words(&[0x10, 0x20, 0x30, 0x40, 0x50]);

    let out = generate::run(
        &table,
        0x400,
        0x5000,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );

    let want: Vec<PrefetchCandidate> = [0x40_u64, 0x80, 0xC0, 0x100]
        .iter()
        .map(|&addr| PrefetchCandidate {
            addr,
            pc: 0x900,
            context: 0,
            priority: i32::MAX / 2,
        })
        .collect();
    assert_eq!(out, want);
    assert_eq!(stats.candidates_identified, 4);
}

/// The read-ahead window never crosses the block end.
#[test]
fn range_window_clamped_at_block_end() {
    let table = table_with_edge(0x400, 0x900, 0, true);
    let mut stats = EngineStats::new();
    let data = vec![0_u8; BLOCK as usize];

    // Offset 56 leaves room for two words of the four requested.
    let out = generate::run(
        &table,
        0x400,
        0x5038,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );
    assert_eq!(out.len(), 2);
}

// ══════════════════════════════════════════════════════════
// 3. Short data and unusable fills
// ══════════════════════════════════════════════════════════

/// Extraction stops as soon as the supplied slice runs short.
#[test]
fn short_slice_stops_extraction() {
    let table = table_with_edge(0x400, 0x900, 0, true);
    let mut stats = EngineStats::new();
    // Six bytes: one full word, then the slice ends.
    let data = vec![0_u8; 6];

    let out = generate::run(
        &table,
        0x400,
        0x5000,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(stats.fills_unusable, 0, "a partial extraction is usable");
}

/// A fill that matched a relation but yielded no word at all counts as
/// unusable.
#[test]
fn empty_extraction_counts_unusable() {
    let table = table_with_edge(0x400, 0x900, 0x100, false);
    let mut stats = EngineStats::new();
    // The access offset is 60, but the slice ends before that word.
    let data = vec![0_u8; 32];

    let out = generate::run(
        &table,
        0x400,
        0x503C,
        &data,
        BLOCK,
        &NoOutstanding,
        &mut stats,
    );
    assert!(out.is_empty());
    assert_eq!(stats.fills_unusable, 1);
}

// ══════════════════════════════════════════════════════════
// 4. In-flight deduplication
// ══════════════════════════════════════════════════════════

/// Every predicted line is checked against the host's outstanding
/// queues; lines already in flight are suppressed and counted.
#[test]
fn in_flight_lines_suppressed() {
    let table = table_with_edge(0x400, 0x900, 0, true);
    let mut stats = EngineStats::new();
    let data = block_of_words(&[0x10, 0x20, 0x30, 0x40]);

    let mut queues = MockQueues::new();
    let _ = queues
        .expect_already_queued()
        .times(4)
        .returning(|addr, _| addr == 0x80);

    let out = generate::run(&table, 0x400, 0x5000, &data, BLOCK, &queues, &mut stats);

    let addrs: Vec<u64> = out.iter().map(|c| c.addr).collect();
    assert_eq!(addrs, vec![0x40, 0xC0, 0x100]);
    assert_eq!(stats.candidates_in_flight, 1);
    assert_eq!(stats.candidates_identified, 3);
}
