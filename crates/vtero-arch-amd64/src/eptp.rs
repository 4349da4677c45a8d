use vtero_core::{Pa, Pfn};

/// EPT paging-structure memory type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EptMemoryType {
    /// Uncacheable (UC).
    Uncacheable,

    /// Write-back (WB).
    WriteBack,
}

/// Extended-Page-Table Pointer.
///
/// Layout (Intel SDM, "Extended-Page-Table Pointer"):
///
/// - bits 2:0 - memory type of the paging structures (0 = UC, 6 = WB)
/// - bits 5:3 - page-walk length minus one
/// - bit 6 - accessed/dirty flag enable
/// - bits 11:7 - reserved
/// - bits 51:12 - physical address of the EPT PML4 table
/// - bits 63:52 - reserved
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Eptp(pub u64);

impl Eptp {
    /// Reserved bits that must be clear.
    pub const RESERVED_MASK: u64 = 0xfff0_0000_0000_0f80;

    /// Page-walk length of 4-level EPT.
    pub const PAGE_WALK_LENGTH: u8 = 4;

    /// Returns the memory type, if it is one the processor accepts.
    pub fn memory_type(self) -> Option<EptMemoryType> {
        match self.0 & 0b111 {
            0 => Some(EptMemoryType::Uncacheable),
            6 => Some(EptMemoryType::WriteBack),
            _ => None,
        }
    }

    /// Returns the page-walk length.
    pub fn page_walk_length(self) -> u8 {
        ((self.0 >> 3) & 0b111) as u8 + 1
    }

    /// Checks if accessed and dirty flags are enabled for EPT.
    pub fn accessed_dirty(self) -> bool {
        (self.0 >> 6) & 1 != 0
    }

    /// Returns the reserved bits of the value.
    pub fn reserved(self) -> u64 {
        self.0 & Self::RESERVED_MASK
    }

    /// Returns the physical address of the EPT PML4 table.
    pub fn pml4(self) -> Pa {
        Pa(self.0 & 0x000f_ffff_ffff_f000)
    }

    /// Returns the page frame number of the EPT PML4 table.
    pub fn pfn(self) -> Pfn {
        self.pml4().pfn()
    }

    /// Checks the structural validity of the pointer.
    ///
    /// The memory type must be UC or WB, the walk length must describe
    /// 4-level paging, reserved bits must be clear and the table address
    /// must be non-zero.
    pub fn is_valid(self) -> bool {
        self.memory_type().is_some()
            && self.page_walk_length() == Self::PAGE_WALK_LENGTH
            && self.reserved() == 0
            && self.pml4().0 != 0
    }

    /// Checks the structural validity of the pointer and that the raw value
    /// lies within `[1, limit)`.
    pub fn is_valid_within(self, limit: u64) -> bool {
        self.0 > 0 && self.0 < limit && self.is_valid()
    }
}

impl From<u64> for Eptp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Eptp> for u64 {
    fn from(value: Eptp) -> Self {
        value.0
    }
}

impl std::fmt::Debug for Eptp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Eptp")
            .field("memory_type", &self.memory_type())
            .field("page_walk_length", &self.page_walk_length())
            .field("accessed_dirty", &self.accessed_dirty())
            .field("pml4", &self.pml4())
            .finish()
    }
}
