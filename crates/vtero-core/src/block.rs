use std::ops::Index;

/// Number of 8-byte entries in a top-level page table.
pub const ENTRIES_PER_TABLE: usize = 512;

/// A page-sized window of 8-byte words.
///
/// The block borrows from the scan buffer; it is the unit every detector
/// inspects.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a>(&'a [u64; ENTRIES_PER_TABLE]);

impl<'a> Block<'a> {
    /// Creates a block view over exactly [`ENTRIES_PER_TABLE`] words.
    ///
    /// Returns `None` for slices of any other length.
    pub fn new(words: &'a [u64]) -> Option<Self> {
        words.try_into().ok().map(Self)
    }

    /// Returns the underlying words.
    pub fn words(self) -> &'a [u64] {
        self.0
    }

    /// Checks if `count` words starting at `start` are all zero.
    pub fn is_zero(self, start: usize, count: usize) -> bool {
        self.0[start..start + count].iter().all(|&word| word == 0)
    }

    /// Returns the lower half of the table (the first 256 entries).
    pub fn lower_half(self) -> &'a [u64] {
        &self.0[..ENTRIES_PER_TABLE / 2]
    }
}

impl Index<usize> for Block<'_> {
    type Output = u64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}
