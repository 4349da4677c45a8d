//! Hyper-V root partition.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, PtType};

use super::is_table_link;
use crate::{BlockLocation, ScanContext};

/// Self-map slot.
pub const SELF_MAP_SLOT: usize = 0x1fe;

/// Bits that disqualify the self-map entry.
pub const RESERVED_MASK: u64 = 0xffff_0000_0000_0480;

/// Matches a Hyper-V PML4.
///
/// The last slot is always empty and the first entry is a kernel mapping.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let first = PageTableEntry(block[0]);
    let self_map = PageTableEntry(block[SELF_MAP_SLOT]);

    if self_map.address().0 == 0
        || !first.matches(0xfff, 0x063)
        || !is_table_link(self_map)
        || block[0x1ff] != 0
        || self_map.any(RESERVED_MASK)
    {
        return false;
    }

    ctx.record(DetectedProc::new(
        PtType::HYPERV,
        self_map.address(),
        location.offset,
        location.true_offset,
        block,
    ));

    true
}
