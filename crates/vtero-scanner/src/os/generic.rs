//! Kernel-agnostic self-map search.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, ENTRIES_PER_TABLE, PtType};

use super::{KERNEL_RW, is_table_link};
use crate::{BlockLocation, ScanContext};

/// Bits that disqualify a self-map candidate.
pub const RESERVED_MASK: u64 = 0x75ff_0000_0000_0480;

/// Matches any table with a kernel-half slot pointing back at itself.
///
/// Slots are compared against the raw file offset, so this detector only
/// finds tables in dumps where file offsets equal physical addresses. The
/// record is keyed by that same offset.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let first = PageTableEntry(block[0]);

    if first.low_byte() != KERNEL_RW && !first.matches(0xfdf, 0x847) {
        return false;
    }

    let half = ENTRIES_PER_TABLE / 2;
    let self_map = (half..ENTRIES_PER_TABLE)
        .rev()
        .map(|slot| PageTableEntry(block[slot]))
        .find(|&entry| {
            is_table_link(entry)
                && !entry.any(RESERVED_MASK)
                && entry.address().0 == location.true_offset
        });

    let Some(self_map) = self_map
    else {
        return false;
    };

    ctx.record(DetectedProc::new(
        PtType::GENERIC,
        self_map.address(),
        location.true_offset,
        location.true_offset,
        block,
    ));

    true
}
