//! Prefetch address generation.
//!
//! When data for an index PC arrives (a fill or a hit with the block's
//! contents), every relation driven by that PC turns the freshly loaded
//! words back into predicted target addresses: read the word at the access
//! offset — or up to `range_degree` consecutive words for a range-type
//! relation — scale by the relation's shift, add its base, and align to
//! block granularity. The host's outstanding queues are consulted so a line
//! already in flight is never proposed twice.

use tracing::trace;

use crate::common::{Addr, Pc, WORD_BYTES};
use crate::event::{PrefetchCandidate, QueueFilter};
use crate::stats::EngineStats;

use super::relation::RelationTable;

/// Generates candidates for a data arrival at `paddr` attributed to `pc`.
///
/// Word extraction never crosses the block end and stops early if the
/// supplied slice runs short; a fill that matched a relation but yielded no
/// word at all is counted as unusable.
pub fn run(
    relations: &RelationTable,
    pc: Pc,
    paddr: Addr,
    data: &[u8],
    block_size: u64,
    queues: &dyn QueueFilter,
    stats: &mut EngineStats,
) -> Vec<PrefetchCandidate> {
    let line_mask = block_size - 1;
    let mut out = Vec::new();
    let mut matched_any = false;
    let mut extracted_any = false;

    for entry in relations.iter_valid().filter(|e| e.index_pc == pc) {
        matched_any = true;
        let offset = (paddr & line_mask) as usize;
        let end = if entry.range {
            (offset + WORD_BYTES * entry.range_degree).min(block_size as usize)
        } else {
            offset + WORD_BYTES
        };

        let mut at = offset;
        while at + WORD_BYTES <= end && at + WORD_BYTES <= data.len() {
            // Reconstruction treats the word as unsigned; the base carries
            // any sign correction in two's complement.
            let word = u64::from(u32::from_le_bytes([
                data[at],
                data[at + 1],
                data[at + 2],
                data[at + 3],
            ]));
            at += WORD_BYTES;
            extracted_any = true;

            let predicted = (word << entry.shift).wrapping_add(entry.base as u64) & !line_mask;
            if queues.already_queued(predicted, entry.context) {
                stats.candidates_in_flight += 1;
                continue;
            }
            trace!(
                index_pc = pc,
                target_pc = entry.target_pc,
                addr = predicted,
                priority = entry.priority,
                "prefetch candidate"
            );
            out.push(PrefetchCandidate {
                addr: predicted,
                pc: entry.target_pc,
                context: entry.context,
                priority: entry.priority,
            });
            stats.record_candidate(entry.target_pc);
        }
    }

    if matched_any && !extracted_any {
        stats.fills_unusable += 1;
    }
    out
}
