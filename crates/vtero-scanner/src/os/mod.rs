//! Self-map heuristics for top-level page tables.
//!
//! Each kernel reserves fixed slots of its top-level tables: one slot maps
//! the table onto itself, others map the kernel image or the direct map.
//! Those slots carry fixed low flag bits and clear reserved bits, which makes
//! a root table recognizable without symbols.

pub mod freebsd;
pub mod generic;
pub mod hyperv;
pub mod linux;
pub mod netbsd;
pub mod openbsd;
pub mod windows;

use vtero_arch_amd64::PageTableEntry;

pub use self::linux::LinuxDetector;

/// Present, writable, accessed and dirty.
const KERNEL_RW: u8 = 0x63;

/// Present, writable, user, accessed and dirty.
const USER_RW: u8 = 0x67;

/// Checks if the low byte of `entry` is one of the writable table-link
/// patterns used by self-map slots.
fn is_table_link(entry: PageTableEntry) -> bool {
    matches!(entry.low_byte(), KERNEL_RW | USER_RW)
}

#[cfg(test)]
#[path = "os_tests.rs"]
mod tests;
