pub(crate) mod macros;

use self::macros::impl_address;

/// Size of a page-table page and of every scanned block, in bytes.
pub const PAGE_SIZE: u64 = 0x1000;

/// Number of bits to shift a byte offset to obtain its page frame number.
pub const PAGE_SHIFT: u64 = 12;

impl_address!(Pa, "physical address");
impl_address!(Pfn, "page frame number");

impl Pa {
    /// Returns the page frame number containing this address.
    pub const fn pfn(self) -> Pfn {
        Pfn(self.0 >> PAGE_SHIFT)
    }
}

impl Pfn {
    /// Returns the physical address of the first byte of this frame.
    pub const fn pa(self) -> Pa {
        Pa(self.0 << PAGE_SHIFT)
    }
}

impl From<Pfn> for Pa {
    fn from(value: Pfn) -> Self {
        value.pa()
    }
}

impl From<Pa> for Pfn {
    fn from(value: Pa) -> Self {
        value.pfn()
    }
}
