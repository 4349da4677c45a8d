//! Linux amd64.

use std::sync::{Mutex, PoisonError};

use vtero_arch_amd64::PageTableEntry;
use vtero_core::{Block, DetectedProc, Pa, PtType};

use crate::{BlockLocation, ScanContext};

/// Kernel-half slots populated in every process PGD.
pub const KERNEL_SLOTS: [usize; 7] = [0xff, 0x110, 0x192, 0x1d1, 0x1d4, 0x1fe, 0x1ff];

/// `(start, count)` ranges that must be empty.
pub const EMPTY_RANGES: [(usize, usize); 4] = [(0x111, 0x80), (0x193, 0x3e), (0x1d2, 0x02), (0x1d5, 0x29)];

const KERNEL_SLOT_MASK: u64 = 0xfff;
const KERNEL_SLOT_PATTERN: u64 = 0x067;

/// Linux PGD detector.
///
/// Linux does not self-map, so a match is recorded at its own offset with
/// a zero difference. Matches are clustered into groups by their lower
/// half: tables that share the same view of the low slots belong to the
/// same group.
#[derive(Debug, Default)]
pub struct LinuxDetector {
    kernel_views: Mutex<Vec<Box<[u64]>>>,
}

impl LinuxDetector {
    /// Creates a detector with no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of groups opened so far.
    pub fn group_count(&self) -> usize {
        self.kernel_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Matches a Linux PGD.
    pub fn detect(&self, ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
        let kernel = KERNEL_SLOTS.iter().all(|&slot| {
            PageTableEntry(block[slot]).matches(KERNEL_SLOT_MASK, KERNEL_SLOT_PATTERN)
        });

        if !kernel
            || !EMPTY_RANGES
                .iter()
                .all(|&(start, count)| block.is_zero(start, count))
        {
            return false;
        }

        if ctx.processes.contains(location.offset) {
            return true;
        }

        let group = self.group_of(block);

        ctx.record(
            DetectedProc::new(
                PtType::LINUX_S,
                Pa(location.offset),
                location.offset,
                location.true_offset,
                block,
            )
            .with_group(group),
        );

        true
    }

    /// Returns the group whose lower half equals the block's, opening a
    /// new one if none does.
    fn group_of(&self, block: Block) -> usize {
        let lower = block.lower_half();
        let mut views = self
            .kernel_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(group) = views.iter().position(|view| **view == *lower) {
            return group;
        }

        views.push(lower.into());
        tracing::trace!(group = views.len() - 1, "new kernel view");
        views.len() - 1
    }
}
