//! Windows x64.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, PtType};

use super::is_table_link;
use crate::{BlockLocation, ScanContext};

/// Self-map slot of kernels before the randomized PTE base.
pub const SELF_MAP_SLOT: usize = 0x1ed;

const FIRST_ENTRY_MASK: u64 = 0xfdf;
const FIRST_ENTRY_PATTERN: u64 = 0x847;

/// Bits that disqualify the self-map entry.
pub const RESERVED_MASK: u64 = 0x7fff_0000_0000_0480;

/// Matches a Windows PML4.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let first = PageTableEntry(block[0]);
    let self_map = PageTableEntry(block[SELF_MAP_SLOT]);

    if !first.matches(FIRST_ENTRY_MASK, FIRST_ENTRY_PATTERN)
        || !is_table_link(self_map)
        || self_map.any(RESERVED_MASK)
    {
        return false;
    }

    ctx.record(DetectedProc::new(
        PtType::WINDOWS,
        self_map.address(),
        location.offset,
        location.true_offset,
        block,
    ));

    true
}
