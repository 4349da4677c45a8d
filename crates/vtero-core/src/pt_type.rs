use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Page-table families recognized by the scanner.
    ///
    /// The scan mode is the union of the families to look for. A detected
    /// process carries exactly one flag, naming the detector that matched.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PtType: u32 {
        /// Windows x64 (fixed self-map slot `0x1ed`).
        const WINDOWS = 0x0000_0001;

        /// FreeBSD amd64.
        const FREEBSD = 0x0000_0002;

        /// OpenBSD amd64.
        const OPENBSD = 0x0000_0004;

        /// NetBSD amd64.
        const NETBSD = 0x0000_0008;

        /// Hyper-V root partition layout.
        const HYPERV = 0x0000_0010;

        /// Linux, single pass with kernel-half grouping.
        const LINUX_S = 0x0000_0020;

        /// Self-pointer heuristic for unknown kernels.
        const GENERIC = 0x0000_0040;

        /// Virtual Machine Control Structures.
        const VMCS = 0x0000_0080;

        /// Every operating system family (no VMCS pass).
        const ALL_OS = Self::WINDOWS.bits()
            | Self::FREEBSD.bits()
            | Self::OPENBSD.bits()
            | Self::NETBSD.bits()
            | Self::HYPERV.bits()
            | Self::LINUX_S.bits();
    }
}

impl std::fmt::Display for PtType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }

            f.write_str(name)?;
            first = false;
        }

        Ok(())
    }
}
