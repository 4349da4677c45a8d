//! NetBSD amd64.

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, PtType};

use super::openbsd::{LINK_MASK, LINK_PATTERN, self_map};
use crate::{BlockLocation, ScanContext};

/// Kernel image slot.
const KERNEL_SLOT: usize = 511;

/// Direct map slots; one of them is populated depending on the release.
const DIRECT_MAP_SLOTS: [usize; 2] = [320, 256];

/// Matches a NetBSD PML4.
///
/// The self-map occupies the same slot as on OpenBSD.
pub fn detect(ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
    let is_link = |slot: usize| PageTableEntry(block[slot]).matches(LINK_MASK, LINK_PATTERN);

    if !is_link(KERNEL_SLOT) || !DIRECT_MAP_SLOTS.into_iter().any(is_link) {
        return false;
    }

    let Some(self_map) = self_map(block)
    else {
        return false;
    };

    ctx.record(DetectedProc::new(
        PtType::NETBSD,
        self_map.address(),
        location.offset,
        location.true_offset,
        block,
    ));

    true
}
