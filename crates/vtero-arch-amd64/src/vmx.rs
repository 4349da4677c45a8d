/// Value of an unused VMCS link pointer field.
pub const VMCS_LINK_POINTER_UNUSED: u64 = u64::MAX;

/// VMCS revision identifiers seen in the wild.
///
/// The revision identifier occupies the first 4 bytes of a VMCS region and
/// must match `IA32_VMX_BASIC[30:0]` of the processor that launched it.
/// Nested hypervisors use software-defined values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RevisionId {
    /// VMware nested virtualization.
    VmwareNested = 0x0000_0001,

    /// Skylake and later.
    Skylake = 0x0000_0004,

    /// Penryn.
    Penryn = 0x0000_000d,

    /// Nehalem.
    Nehalem = 0x0000_000e,

    /// Westmere.
    Westmere = 0x0000_000f,

    /// Sandy Bridge.
    SandyBridge = 0x0000_0010,

    /// Ivy Bridge.
    IvyBridge = 0x0000_0011,

    /// Haswell and Broadwell.
    Haswell = 0x0000_0012,

    /// KVM nested virtualization (`VMCS12_REVISION`).
    KvmNested = 0x11e5_7ed0,
}

impl RevisionId {
    /// Decodes a raw revision identifier.
    ///
    /// Returns `None` for values that are not known.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0x0000_0001 => Some(Self::VmwareNested),
            0x0000_0004 => Some(Self::Skylake),
            0x0000_000d => Some(Self::Penryn),
            0x0000_000e => Some(Self::Nehalem),
            0x0000_000f => Some(Self::Westmere),
            0x0000_0010 => Some(Self::SandyBridge),
            0x0000_0011 => Some(Self::IvyBridge),
            0x0000_0012 => Some(Self::Haswell),
            0x11e5_7ed0 => Some(Self::KvmNested),
            _ => None,
        }
    }

    /// Returns the word index of the EPTP field for vendor layouts where it
    /// is known.
    pub fn canonical_eptp_slot(self) -> Option<usize> {
        match self {
            Self::VmwareNested => Some(14),
            _ => None,
        }
    }
}

/// VMX-abort indicators (Intel SDM, "VMX Aborts").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VmxAbort {
    /// No abort occurred.
    None = 0,

    /// Saving guest MSRs failed.
    GuestMsrSave = 1,

    /// Host checking of the PDPTEs failed.
    HostPdpteCheck = 2,

    /// The current VMCS was corrupted.
    VmcsCorrupted = 3,

    /// Loading host MSRs failed.
    HostMsrLoad = 4,

    /// A machine-check event occurred during VM exit.
    MachineCheck = 5,

    /// The VM exit would have left IA-32e mode without a 64-bit host.
    HostAddressSpace = 6,
}

impl VmxAbort {
    /// Decodes a raw abort indicator.
    ///
    /// Returns `None` for values that are not known.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::GuestMsrSave),
            2 => Some(Self::HostPdpteCheck),
            3 => Some(Self::VmcsCorrupted),
            4 => Some(Self::HostMsrLoad),
            5 => Some(Self::MachineCheck),
            6 => Some(Self::HostAddressSpace),
            _ => None,
        }
    }
}

/// The first 8 bytes of a VMCS region.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct VmcsHeader(pub u64);

impl VmcsHeader {
    /// Returns the raw revision identifier (low 32 bits).
    pub fn raw_revision_id(self) -> u32 {
        self.0 as u32
    }

    /// Returns the raw VMX-abort indicator (bits 62:32).
    pub fn raw_abort(self) -> u32 {
        ((self.0 >> 32) & 0x7fff_ffff) as u32
    }

    /// Returns the revision identifier, if known.
    pub fn revision_id(self) -> Option<RevisionId> {
        RevisionId::from_raw(self.raw_revision_id())
    }

    /// Returns the VMX-abort indicator, if known.
    pub fn abort(self) -> Option<VmxAbort> {
        VmxAbort::from_raw(self.raw_abort())
    }
}

impl std::fmt::Debug for VmcsHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("VmcsHeader")
            .field("revision_id", &format_args!("0x{:08x}", self.raw_revision_id()))
            .field("abort", &format_args!("0x{:08x}", self.raw_abort()))
            .finish()
    }
}
