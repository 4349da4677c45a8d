//! Memory runs of sparse physical memory dumps.
//!
//! A dump does not always store physical memory contiguously. Gaps in the
//! physical address space are omitted from the file, so page `n` of the file
//! is not necessarily physical frame `n`. The scanner queries a
//! [`MemoryRunIndex`] to learn where a frame is actually stored.

use serde::{Deserialize, Serialize};

/// Result of a [`MemoryRunIndex`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLookup {
    /// The frame is backed by the file at the given page index.
    Mapped(u64),

    /// The frame falls into a gap; the next frame may be mapped.
    Skip,

    /// No mapped run exists at or beyond the frame.
    End,
}

/// Address-space index of a dump.
pub trait MemoryRunIndex: Send + Sync {
    /// Resolves a page frame number to the file page that stores it.
    fn lookup(&self, pfn: u64) -> RunLookup;
}

/// Index of a dump that stores physical memory without gaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct Contiguous;

impl MemoryRunIndex for Contiguous {
    fn lookup(&self, pfn: u64) -> RunLookup {
        RunLookup::Mapped(pfn)
    }
}

/// A contiguous extent of physical memory stored in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRun {
    /// First physical frame of the run.
    pub base_page: u64,

    /// Number of frames in the run.
    pub page_count: u64,
}

impl MemoryRun {
    /// Returns the first frame past the end of the run.
    pub fn end_page(&self) -> u64 {
        self.base_page + self.page_count
    }
}

/// Index over runs stored back to back in the file, in ascending order.
#[derive(Debug, Default, Clone)]
pub struct MemoryRuns {
    runs: Vec<MemoryRun>,

    /// File page index of the first frame of each run.
    file_pages: Vec<u64>,
}

impl MemoryRuns {
    /// Creates an index from a list of runs.
    ///
    /// Runs are sorted by base frame; empty runs are dropped.
    pub fn new(runs: impl IntoIterator<Item = MemoryRun>) -> Self {
        let mut runs: Vec<_> = runs.into_iter().filter(|run| run.page_count > 0).collect();
        runs.sort_by_key(|run| run.base_page);

        let file_pages = runs
            .iter()
            .scan(0, |next, run| {
                let first = *next;
                *next += run.page_count;
                Some(first)
            })
            .collect();

        Self { runs, file_pages }
    }

    /// Returns the total number of frames stored in the file.
    pub fn total_pages(&self) -> u64 {
        self.runs.iter().map(|run| run.page_count).sum()
    }
}

impl MemoryRunIndex for MemoryRuns {
    fn lookup(&self, pfn: u64) -> RunLookup {
        // Index of the first run that ends past `pfn`.
        let index = self.runs.partition_point(|run| run.end_page() <= pfn);

        match self.runs.get(index) {
            Some(run) if pfn >= run.base_page => {
                RunLookup::Mapped(self.file_pages[index] + (pfn - run.base_page))
            }
            Some(_) => RunLookup::Skip,
            None => RunLookup::End,
        }
    }
}
