use vtero_core::{Pa, Pfn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A page table entry in the paging structures.
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PageTableEntry(pub u64);

impl PageTableEntry {
    /// Mask of the physical address bits used by the self-map heuristics.
    pub const ADDRESS_MASK: u64 = 0x0000_ffff_ffff_f000;

    /// Checks if the page is present in physical memory.
    pub fn present(self) -> bool {
        self.0 & 1 != 0
    }

    /// Checks if the page is writable.
    pub fn write(self) -> bool {
        (self.0 >> 1) & 1 != 0
    }

    /// Checks if the page is accessible in user mode.
    pub fn user(self) -> bool {
        (self.0 >> 2) & 1 != 0
    }

    /// Checks if the page has been accessed.
    pub fn accessed(self) -> bool {
        (self.0 >> 5) & 1 != 0
    }

    /// Checks if the page has been written to.
    pub fn dirty(self) -> bool {
        (self.0 >> 6) & 1 != 0
    }

    /// Checks if this entry refers to a large page.
    pub fn large(self) -> bool {
        (self.0 >> 7) & 1 != 0
    }

    /// Checks if execution from the page is disabled.
    pub fn execute_disable(self) -> bool {
        (self.0 >> 63) & 1 != 0
    }

    /// Checks if the bits selected by `mask` equal `pattern`.
    pub fn matches(self, mask: u64, pattern: u64) -> bool {
        self.0 & mask == pattern
    }

    /// Checks if any bit of `mask` is set.
    pub fn any(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    /// Returns the low byte (the architectural flags) of the entry.
    pub fn low_byte(self) -> u8 {
        self.0 as u8
    }

    /// Returns the page-aligned physical address the entry points to.
    pub fn address(self) -> Pa {
        Pa(self.0 & Self::ADDRESS_MASK)
    }

    /// Extracts the page frame number from the entry.
    pub fn pfn(self) -> Pfn {
        self.address().pfn()
    }
}

impl From<u64> for PageTableEntry {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("present", &self.present())
            .field("write", &self.write())
            .field("user", &self.user())
            .field("accessed", &self.accessed())
            .field("dirty", &self.dirty())
            .field("large", &self.large())
            .field("execute_disable", &self.execute_disable())
            .field("pfn", &self.pfn())
            .finish()
    }
}
