//! FreeBSD amd64.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, PtType};

use crate::{BlockLocation, ScanContext};

/// Recursive PML4 slot (`PML4PML4I`).
pub const SELF_MAP_SLOT: usize = 0x100;

/// Bits that disqualify the self-map entry.
pub const RESERVED_MASK: u64 = 0x7fff_0000_0000_0000;

/// Matches a FreeBSD PML4.
///
/// Slots 0 and 0xff carry user mappings, the self-map slot a supervisor
/// one.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let self_map = PageTableEntry(block[SELF_MAP_SLOT]);

    if PageTableEntry(block[0]).low_byte() != 0x67
        || PageTableEntry(block[0xff]).low_byte() != 0x67
        || self_map.low_byte() != 0x63
        || self_map.any(RESERVED_MASK)
    {
        return false;
    }

    ctx.record(DetectedProc::new(
        PtType::FREEBSD,
        self_map.address(),
        location.offset,
        location.true_offset,
        block,
    ));

    true
}
