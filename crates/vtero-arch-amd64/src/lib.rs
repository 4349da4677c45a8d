//! AMD64 and Intel VT-x definitions used by the scanner.

mod eptp;
mod paging;
mod vmx;

pub use self::{
    eptp::{EptMemoryType, Eptp},
    paging::PageTableEntry,
    vmx::{RevisionId, VMCS_LINK_POINTER_UNUSED, VmcsHeader, VmxAbort},
};
