//! Core data model for physical memory dump analysis.
//!
//! This crate holds the types shared by the scanner and its consumers:
//! address newtypes, the [`PtType`] scan-mode flags, detection records
//! ([`DetectedProc`], [`Vmcs`]) and the concurrent registries that collect
//! them, the [`Block`] view every detector inspects, and the
//! [`MemoryRunIndex`] used to map sparse dumps.

mod block;
mod core;
mod error;
mod process;
mod pt_type;
mod registry;
pub mod run;
mod vmcs;

pub use self::{
    block::{Block, ENTRIES_PER_TABLE},
    core::{PAGE_SHIFT, PAGE_SIZE, Pa, Pfn},
    error::VteroError,
    process::{DetectedProc, TopPageTable},
    pt_type::PtType,
    registry::{ProcessRegistry, VmcsRegistry},
    run::{Contiguous, MemoryRun, MemoryRunIndex, MemoryRuns, RunLookup},
    vmcs::Vmcs,
};
