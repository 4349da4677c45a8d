use std::sync::Arc;

use rayon::prelude::*;
use vtero_arch_amd64::{Eptp, VMCS_LINK_POINTER_UNUSED, VmcsHeader};
use vtero_core::{Block, DetectedProc, Vmcs, VteroError};

use crate::{BlockLocation, ScanContext};

/// Most all-ones words a VMCS page may contain.
///
/// A real VMCS has a single unused link pointer, but a few vendor layouts
/// leave other fields at all-ones as well.
pub const MAX_LINK_POINTERS: usize = 32;

/// VMCS detector.
///
/// A page is a VMCS candidate when its header decodes to a known revision
/// and abort indicator. It becomes a match only if it also contains the CR3
/// of a page-table root found by a previous scan; every valid EPTP in the
/// page is then recorded against that root.
#[derive(Debug)]
pub struct VmcsDetector {
    candidates: Vec<Arc<DetectedProc>>,
}

impl VmcsDetector {
    /// Creates a detector anchored on the given page-table roots.
    ///
    /// Roots with a zero CR3 are ignored. Fails if no usable root remains.
    pub fn new(candidates: &[Arc<DetectedProc>]) -> Result<Self, VteroError> {
        let candidates: Vec<_> = candidates
            .iter()
            .filter(|process| process.cr3.0 != 0)
            .cloned()
            .collect();

        if candidates.is_empty() {
            return Err(VteroError::MissingVmcsCandidates);
        }

        Ok(Self { candidates })
    }

    /// Returns the page-table roots this detector anchors on.
    pub fn candidates(&self) -> &[Arc<DetectedProc>] {
        &self.candidates
    }

    /// Matches a VMCS page containing one of the candidate CR3 values.
    pub fn detect(&self, ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
        let header = VmcsHeader(block[0]);
        let Some(revision) = header.revision_id()
        else {
            return false;
        };

        if header.abort().is_none() {
            return false;
        }

        let link_pointers = block
            .words()
            .iter()
            .filter(|&&word| word == VMCS_LINK_POINTER_UNUSED)
            .count();

        if !(1..=MAX_LINK_POINTERS).contains(&link_pointers) {
            return false;
        }

        let found: Vec<Vmcs> = self
            .candidates
            .par_iter()
            .filter(|process| block.words()[1..].contains(&process.cr3.0))
            .flat_map_iter(|process| {
                let eptps = collect_eptps(block, ctx.file_size);

                let eptps = match revision.canonical_eptp_slot() {
                    Some(slot) if eptps.contains(&block[slot]) => vec![block[slot]],
                    _ => eptps,
                };

                eptps.into_iter().map(move |eptp| Vmcs {
                    process: Arc::clone(process),
                    eptp,
                    guest_cr3: process.cr3,
                    offset: location.offset,
                })
            })
            .collect();

        if found.is_empty() {
            return false;
        }

        for vmcs in &found {
            tracing::info!(
                offset = location.offset,
                eptp = vmcs.eptp,
                guest_cr3 = %vmcs.guest_cr3,
                ?revision,
                "VMCS"
            );
        }

        ctx.vmcs.extend(found);
        true
    }
}

/// Collects the distinct words of the block that are valid EPTPs within
/// the dump, in slot order.
fn collect_eptps(block: Block, file_size: u64) -> Vec<u64> {
    let mut eptps = Vec::new();

    for &word in block.words() {
        if Eptp(word).is_valid_within(file_size) && !eptps.contains(&word) {
            eptps.push(word);
        }
    }

    eptps
}

#[cfg(test)]
#[path = "vmcs_tests.rs"]
mod tests;
