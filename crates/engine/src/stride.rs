//! Stride classification and fallback prefetching.
//!
//! The companion stride detector serves the engine in two roles:
//! 1. **Auxiliary classifier:** the matcher asks whether an index PC walks
//!    memory at a constant stride when deciding if a new relation is
//!    range-type (multi-word read-ahead) or single-access.
//! 2. **Fallback producer:** accesses that never form an indirect relation
//!    can still benefit from plain stride prefetching, so every classified
//!    access is offered to the detector and any addresses it proposes are
//!    surfaced as ordinary candidates.
//!
//! The reference implementation is a small direct-mapped prediction table
//! hashed by PC and context, with a 2-bit saturating confidence counter per
//! entry. Aliasing between streams is tolerated, as in hardware.

use crate::common::{Addr, ContextId, Pc};

/// Confidence ceiling; prefetches are produced only at saturation.
const CONFIDENCE_MAX: u8 = 3;

/// Auxiliary regular-access classifier and stride-prefetch producer.
pub trait StrideClassifier: Send + Sync {
    /// Observes a classified access and returns block-aligned stride
    /// prefetch addresses, empty until a stable stride is established.
    fn observe(&mut self, pc: Pc, addr: Addr, context: ContextId) -> Vec<Addr>;

    /// Returns true when `pc` has an established constant-stride pattern in
    /// `context`.
    fn is_regular(&self, pc: Pc, context: ContextId) -> bool;
}

/// Entry in the stride prediction table.
#[derive(Debug, Default, Clone, Copy)]
struct StreamEntry {
    /// The last address accessed by this stream.
    last_addr: u64,
    /// The detected stride (difference between consecutive accesses).
    stride: i64,
    /// Confidence counter (2-bit saturating).
    confidence: u8,
}

/// Direct-mapped stride prediction table.
#[derive(Debug)]
pub struct TableStrideClassifier {
    /// Prediction table, indexed by a PC/context hash.
    table: Vec<StreamEntry>,
    /// Size of a cache block in bytes.
    block_bytes: u64,
    /// Mask used to index the table.
    table_mask: usize,
    /// Number of strides to prefetch ahead.
    degree: usize,
}

impl TableStrideClassifier {
    /// Creates a new stride classifier.
    ///
    /// # Arguments
    ///
    /// * `table_size` - Number of table entries (must be a power of two;
    ///   falls back to 64 otherwise).
    /// * `block_bytes` - Cache block size in bytes.
    /// * `degree` - Number of strides to prefetch ahead (minimum 1).
    pub fn new(table_size: usize, block_bytes: u64, degree: usize) -> Self {
        let safe_size = if table_size > 0 && table_size.is_power_of_two() {
            table_size
        } else {
            64
        };

        Self {
            table: vec![StreamEntry::default(); safe_size],
            block_bytes,
            table_mask: safe_size - 1,
            degree: if degree == 0 { 1 } else { degree },
        }
    }

    /// Table slot for a PC/context pair. Low PC bits below instruction
    /// alignment carry no information, so they are shifted out first.
    fn slot(&self, pc: Pc, context: ContextId) -> usize {
        ((pc >> 2) as usize ^ context as usize) & self.table_mask
    }
}

impl StrideClassifier for TableStrideClassifier {
    /// Observes an access and generates stride prefetch candidates.
    ///
    /// Updates the tracking entry with the current address. Once the same
    /// stride repeats to saturation, generates `degree` look-ahead
    /// addresses along that stride.
    fn observe(&mut self, pc: Pc, addr: Addr, context: ContextId) -> Vec<Addr> {
        let idx = self.slot(pc, context);
        let entry = &mut self.table[idx];

        let current_stride = (addr as i64).wrapping_sub(entry.last_addr as i64);
        let mut prefetches = Vec::new();

        if current_stride == entry.stride {
            if entry.confidence < CONFIDENCE_MAX {
                entry.confidence += 1;
            } else if entry.stride != 0 {
                for k in 1..=self.degree {
                    let lookahead = entry.stride.wrapping_mul(k as i64);
                    let target = (addr as i64).wrapping_add(lookahead) as u64;

                    let aligned = target & !(self.block_bytes - 1);
                    prefetches.push(aligned);
                }
            }
        } else if entry.confidence > 0 {
            entry.confidence -= 1;
        } else {
            entry.stride = current_stride;
        }

        entry.last_addr = addr;
        prefetches
    }

    /// A stream is regular when its confidence counter is saturated on a
    /// non-zero stride.
    fn is_regular(&self, pc: Pc, context: ContextId) -> bool {
        let entry = &self.table[self.slot(pc, context)];
        entry.confidence >= CONFIDENCE_MAX && entry.stride != 0
    }
}
