use vtero_core::{DetectedProc, ProcessRegistry, VmcsRegistry};

/// Where a block was found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// Offset after memory-run adjustment.
    pub offset: u64,

    /// Raw offset of the block in the file.
    pub true_offset: u64,
}

impl BlockLocation {
    /// Location of a block in a dump without gaps.
    pub fn contiguous(offset: u64) -> Self {
        Self {
            offset,
            true_offset: offset,
        }
    }
}

/// Per-scan state shared by every detector invocation.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    /// Size of the dump, in bytes.
    pub file_size: u64,

    /// Destination of page-table root detections.
    pub processes: &'a ProcessRegistry,

    /// Destination of VMCS detections.
    pub vmcs: &'a VmcsRegistry,
}

impl<'a> ScanContext<'a> {
    /// Creates a context writing into the given registries.
    pub fn new(file_size: u64, processes: &'a ProcessRegistry, vmcs: &'a VmcsRegistry) -> Self {
        Self {
            file_size,
            processes,
            vmcs,
        }
    }

    /// Records a detected process unless its offset is already known.
    pub(crate) fn record(&self, process: DetectedProc) {
        if self.processes.contains(process.file_offset) {
            return;
        }

        let (kind, offset, cr3, diff, group) = (
            process.kind,
            process.file_offset,
            process.cr3,
            process.diff,
            process.group,
        );

        if self.processes.insert(process) {
            tracing::debug!(%kind, offset, %cr3, diff, ?group, "page table root");
        }
    }
}
