use vtero_core::{MemoryRunIndex, PAGE_SHIFT, PAGE_SIZE, RunLookup};

use crate::BlockLocation;

/// Corrects raw file offsets for gaps in sparse dumps.
///
/// The shift found while skipping over a gap is kept, so later blocks of
/// the same scan resume the search where the previous one ended.
pub struct RunAdjuster<'a> {
    index: &'a dyn MemoryRunIndex,
    shift: u64,
}

impl<'a> RunAdjuster<'a> {
    /// Creates an adjuster over `index` with no accumulated shift.
    pub fn new(index: &'a dyn MemoryRunIndex) -> Self {
        Self { index, shift: 0 }
    }

    /// Returns the number of frames skipped so far.
    pub fn shift(&self) -> u64 {
        self.shift
    }

    /// Returns the corrected offset of the page at `offset`.
    ///
    /// When the index reports no further runs, the offset is returned
    /// unchanged.
    pub fn adjust(&mut self, offset: u64) -> u64 {
        let pfn = offset >> PAGE_SHIFT;

        loop {
            let shifted = pfn + self.shift;

            match self.index.lookup(shifted) {
                RunLookup::Mapped(indexed) => {
                    return offset + (indexed.abs_diff(shifted) << PAGE_SHIFT);
                }
                RunLookup::Skip => self.shift += 1,
                RunLookup::End => {
                    tracing::warn!(offset, shift = self.shift, "no memory run, offset not adjusted");
                    return offset;
                }
            }
        }
    }

    /// Locates every page of a chunk starting at `chunk_base` that holds
    /// `valid_bytes` bytes of the dump.
    pub(crate) fn locate_chunk(&mut self, chunk_base: u64, valid_bytes: usize) -> Vec<BlockLocation> {
        (0..valid_bytes.div_ceil(PAGE_SIZE as usize) as u64)
            .map(|page| {
                let true_offset = chunk_base + page * PAGE_SIZE;

                BlockLocation {
                    offset: self.adjust(true_offset),
                    true_offset,
                }
            })
            .collect()
    }
}
