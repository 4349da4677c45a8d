//! Symbol-less discovery of page-table roots and VMCS in physical memory
//! dumps.
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`] holds the data model shared by every component: address
//!   newtypes, [`PtType`] scan-mode flags, detection records and the
//!   registries collecting them.
//! - [`arch::amd64`] decodes page table entries, EPT pointers and VMCS
//!   headers.
//! - [`scanner`] hosts the windowed [`Scanner`], its detectors and the
//!   [`BackwardValueScan`] utility.
//!
//! # Example
//!
//! ```no_run
//! use vtero::{PtType, Scanner, VteroError};
//!
//! # fn main() -> Result<(), VteroError> {
//! let mut scanner = Scanner::new("memory.raw").with_scan_mode(PtType::ALL_OS);
//! scanner.analyze(0)?;
//!
//! for process in scanner.processes().snapshot() {
//!     println!("{process}");
//! }
//!
//! // Anchor the VMCS pass on the roots found above.
//! let candidates = scanner.processes().snapshot();
//! scanner.set_vmcs_candidates(candidates);
//! scanner.set_scan_mode(PtType::VMCS);
//! scanner.analyze(0)?;
//!
//! for vmcs in scanner.vmcs().snapshot() {
//!     println!("{vmcs}");
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use vtero_core as core;
pub use vtero_core::{
    Block, DetectedProc, MemoryRun, MemoryRunIndex, MemoryRuns, Pa, Pfn, ProcessRegistry,
    PtType, RunLookup, TopPageTable, Vmcs, VmcsRegistry, VteroError,
};

/// Architecture definitions.
pub mod arch {
    /// AMD64 and Intel VT-x definitions.
    #[cfg(feature = "arch-amd64")]
    #[cfg_attr(docsrs, doc(cfg(feature = "arch-amd64")))]
    pub mod amd64 {
        pub use vtero_arch_amd64::*;
    }
}

/// Page-table root and VMCS scanner.
#[cfg(feature = "scanner")]
#[cfg_attr(docsrs, doc(cfg(feature = "scanner")))]
pub mod scanner {
    pub use vtero_scanner::*;
}

#[cfg(feature = "scanner")]
pub use vtero_scanner::{
    BackwardScanOptions, BackwardValueScan, ScanOptions, ScanProgress, ScanValue, Scanner,
};
