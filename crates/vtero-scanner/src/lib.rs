//! Symbol-less discovery of page-table roots and VMCS in physical memory
//! dumps.
//!
//! The [`Scanner`] walks a raw dump page by page and runs a set of
//! heuristic detectors against every page. Each detector recognizes the
//! top-level page table of one kernel family by its self-map convention,
//! and records a [`DetectedProc`] when it matches. A second pass with the
//! VMCS detector anchors on those roots to find the control structures of
//! the hypervisors that run them.
//!
//! [`BackwardValueScan`] is an independent utility that searches a file from
//! its end for a single value.
//!
//! [`DetectedProc`]: vtero_core::DetectedProc

mod adjust;
mod backward;
mod context;
mod dispatch;
mod engine;
mod options;
pub mod os;
mod progress;
mod vmcs;

pub use self::{
    adjust::RunAdjuster,
    backward::{BackwardValueScan, ScanValue},
    context::{BlockLocation, ScanContext},
    dispatch::{CheckDispatcher, Detector, DetectorKind},
    engine::Scanner,
    options::{BackwardScanOptions, ScanOptions},
    progress::ScanProgress,
    vmcs::{MAX_LINK_POINTERS, VmcsDetector},
};
