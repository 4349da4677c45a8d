use std::sync::Arc;

use crate::{DetectedProc, Pa};

/// A candidate Virtual Machine Control Structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vmcs {
    /// The guest page-table root whose CR3 was found in this structure.
    pub process: Arc<DetectedProc>,

    /// Validated extended-page-table pointer.
    pub eptp: u64,

    /// The guest CR3 value that anchored the match.
    pub guest_cr3: Pa,

    /// File offset of the VMCS page.
    pub offset: u64,
}

impl std::fmt::Display for Vmcs {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "VMCS @ 0x{:x} EPTP 0x{:016x} guest CR3 {} ({})",
            self.offset, self.eptp, self.guest_cr3, self.process.kind
        )
    }
}
