use std::sync::Arc;

use vtero_core::{Block, DetectedProc, PtType, VteroError};

use crate::{
    BlockLocation, ScanContext,
    os::{LinuxDetector, freebsd, generic, hyperv, netbsd, openbsd, windows},
    vmcs::VmcsDetector,
};

/// Identifies a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// Kernel-agnostic self-map search.
    Generic,

    /// Windows PML4.
    Windows,

    /// Hyper-V PML4.
    HyperV,

    /// FreeBSD PML4.
    FreeBsd,

    /// OpenBSD PML4.
    OpenBsd,

    /// NetBSD PML4.
    NetBsd,

    /// Linux PGD.
    LinuxS,

    /// VMCS anchored on previously found roots.
    Vmcs,
}

impl DetectorKind {
    /// Every detector, in the order they run against a block.
    pub const ORDER: [Self; 8] = [
        Self::Generic,
        Self::Windows,
        Self::HyperV,
        Self::FreeBsd,
        Self::OpenBsd,
        Self::NetBsd,
        Self::LinuxS,
        Self::Vmcs,
    ];

    /// Returns the scan-mode flag that enables this detector.
    pub fn pt_type(self) -> PtType {
        match self {
            Self::Generic => PtType::GENERIC,
            Self::Windows => PtType::WINDOWS,
            Self::HyperV => PtType::HYPERV,
            Self::FreeBsd => PtType::FREEBSD,
            Self::OpenBsd => PtType::OPENBSD,
            Self::NetBsd => PtType::NETBSD,
            Self::LinuxS => PtType::LINUX_S,
            Self::Vmcs => PtType::VMCS,
        }
    }
}

/// Selects the detectors to run from a scan mode.
#[derive(Debug, Default, Clone)]
pub struct CheckDispatcher {
    mode: PtType,
    active: Vec<DetectorKind>,
}

impl CheckDispatcher {
    /// Creates a dispatcher for the given scan mode.
    pub fn new(mode: PtType) -> Self {
        let mut dispatcher = Self::default();
        dispatcher.set_scan_mode(mode);
        dispatcher
    }

    /// Replaces the scan mode and rebuilds the active detector list.
    pub fn set_scan_mode(&mut self, mode: PtType) {
        self.mode = mode;
        self.active = DetectorKind::ORDER
            .into_iter()
            .filter(|kind| mode.contains(kind.pt_type()))
            .collect();
    }

    /// Returns the current scan mode.
    pub fn scan_mode(&self) -> PtType {
        self.mode
    }

    /// Returns the active detectors, in dispatch order.
    pub fn active(&self) -> &[DetectorKind] {
        &self.active
    }

    /// Creates fresh detector state for one scan.
    ///
    /// Fails if the VMCS detector is active and `candidates` holds no
    /// usable page-table root.
    pub fn instantiate(
        &self,
        candidates: &[Arc<DetectedProc>],
    ) -> Result<Vec<Detector>, VteroError> {
        self.active
            .iter()
            .map(|&kind| Detector::new(kind, candidates))
            .collect()
    }
}

/// A detector together with its per-scan state.
#[derive(Debug)]
pub enum Detector {
    /// Kernel-agnostic self-map search.
    Generic,

    /// Windows PML4.
    Windows,

    /// Hyper-V PML4.
    HyperV,

    /// FreeBSD PML4.
    FreeBsd,

    /// OpenBSD PML4.
    OpenBsd,

    /// NetBSD PML4.
    NetBsd,

    /// Linux PGD, with its kernel-view groups.
    LinuxS(LinuxDetector),

    /// VMCS, with its candidate roots.
    Vmcs(VmcsDetector),
}

impl Detector {
    /// Creates the detector for `kind`.
    pub fn new(kind: DetectorKind, candidates: &[Arc<DetectedProc>]) -> Result<Self, VteroError> {
        Ok(match kind {
            DetectorKind::Generic => Self::Generic,
            DetectorKind::Windows => Self::Windows,
            DetectorKind::HyperV => Self::HyperV,
            DetectorKind::FreeBsd => Self::FreeBsd,
            DetectorKind::OpenBsd => Self::OpenBsd,
            DetectorKind::NetBsd => Self::NetBsd,
            DetectorKind::LinuxS => Self::LinuxS(LinuxDetector::new()),
            DetectorKind::Vmcs => Self::Vmcs(VmcsDetector::new(candidates)?),
        })
    }

    /// Returns the kind of this detector.
    pub fn kind(&self) -> DetectorKind {
        match self {
            Self::Generic => DetectorKind::Generic,
            Self::Windows => DetectorKind::Windows,
            Self::HyperV => DetectorKind::HyperV,
            Self::FreeBsd => DetectorKind::FreeBsd,
            Self::OpenBsd => DetectorKind::OpenBsd,
            Self::NetBsd => DetectorKind::NetBsd,
            Self::LinuxS(_) => DetectorKind::LinuxS,
            Self::Vmcs(_) => DetectorKind::Vmcs,
        }
    }

    /// Runs the detector against one block.
    pub fn detect(&self, ctx: &ScanContext, block: Block, location: BlockLocation) -> bool {
        match self {
            Self::Generic => generic::detect(ctx, block, location),
            Self::Windows => windows::detect(ctx, block, location),
            Self::HyperV => hyperv::detect(ctx, block, location),
            Self::FreeBsd => freebsd::detect(ctx, block, location),
            Self::OpenBsd => openbsd::detect(ctx, block, location),
            Self::NetBsd => netbsd::detect(ctx, block, location),
            Self::LinuxS(detector) => detector.detect(ctx, block, location),
            Self::Vmcs(detector) => detector.detect(ctx, block, location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_has_no_detectors() {
        let dispatcher = CheckDispatcher::default();

        assert!(dispatcher.scan_mode().is_empty());
        assert!(dispatcher.active().is_empty());
    }

    #[test]
    fn active_detectors_follow_fixed_order() {
        let dispatcher =
            CheckDispatcher::new(PtType::LINUX_S | PtType::WINDOWS | PtType::GENERIC);

        assert_eq!(
            dispatcher.active(),
            [DetectorKind::Generic, DetectorKind::Windows, DetectorKind::LinuxS]
        );
    }

    #[test]
    fn set_scan_mode_rebuilds() {
        let mut dispatcher = CheckDispatcher::new(PtType::all());
        assert_eq!(dispatcher.active(), DetectorKind::ORDER);

        dispatcher.set_scan_mode(PtType::FREEBSD | PtType::NETBSD);
        assert_eq!(dispatcher.scan_mode(), PtType::FREEBSD | PtType::NETBSD);
        assert_eq!(
            dispatcher.active(),
            [DetectorKind::FreeBsd, DetectorKind::NetBsd]
        );
    }

    #[test]
    fn vmcs_requires_candidates() {
        let dispatcher = CheckDispatcher::new(PtType::WINDOWS | PtType::VMCS);

        assert!(matches!(
            dispatcher.instantiate(&[]),
            Err(VteroError::MissingVmcsCandidates)
        ));
    }

    #[test]
    fn instantiate_without_vmcs() -> Result<(), VteroError> {
        let dispatcher = CheckDispatcher::new(PtType::WINDOWS | PtType::LINUX_S);
        let detectors = dispatcher.instantiate(&[])?;

        let kinds: Vec<_> = detectors.iter().map(Detector::kind).collect();
        assert_eq!(kinds, [DetectorKind::Windows, DetectorKind::LinuxS]);
        Ok(())
    }
}
