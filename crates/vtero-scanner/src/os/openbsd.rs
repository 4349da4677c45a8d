//! OpenBSD amd64.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, PtType};

use crate::{BlockLocation, ScanContext};

/// Recursive PML4 slot (`PDIR_SLOT_PTE`).
pub const SELF_MAP_SLOT: usize = 255;

/// Slots that map kernel structures next to the self-map.
const KERNEL_SLOTS: [usize; 3] = [510, 256, 254];

/// Bits that disqualify the self-map entry.
pub const RESERVED_MASK: u64 = 0x7fff_0000_0000_0000;

/// Ignores the user/accessed bits of kernel slots.
pub(super) const LINK_MASK: u64 = 0xf3;
pub(super) const LINK_PATTERN: u64 = 0x63;

/// Checks the self-map entry shared by the OpenBSD and NetBSD layouts.
pub(super) fn self_map(block: Block) -> Option<PageTableEntry> {
    let entry = PageTableEntry(block[SELF_MAP_SLOT]);

    if entry.matches(LINK_MASK, LINK_PATTERN) && !entry.any(RESERVED_MASK) {
        Some(entry)
    }
    else {
        None
    }
}

/// Matches an OpenBSD PML4.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let kernel = KERNEL_SLOTS
        .iter()
        .all(|&slot| PageTableEntry(block[slot]).matches(LINK_MASK, LINK_PATTERN));

    if !kernel {
        return false;
    }

    let Some(self_map) = self_map(block)
    else {
        return false;
    };

    ctx.record(DetectedProc::new(
        PtType::OPENBSD,
        self_map.address(),
        location.offset,
        location.true_offset,
        block,
    ));

    true
}
