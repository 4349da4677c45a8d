use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Block, Pa, PtType};

/// The non-zero entries of a top-level page table, keyed by slot index.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPageTable(BTreeMap<u16, u64>);

impl TopPageTable {
    /// Collects every non-zero entry of the block.
    pub fn from_block(block: Block) -> Self {
        Self(
            block
                .words()
                .iter()
                .enumerate()
                .filter(|&(_, &entry)| entry != 0)
                .map(|(index, &entry)| (index as u16, entry))
                .collect(),
        )
    }

    /// Returns the raw entry at `index`, if it is non-zero.
    pub fn get(&self, index: u16) -> Option<u64> {
        self.0.get(&index).copied()
    }

    /// Returns the number of non-zero entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if every entry of the table was zero.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(index, entry)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.0.iter().map(|(&index, &entry)| (index, entry))
    }
}

/// A candidate process page-table root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedProc {
    /// Physical address of the top-level table claimed by its self-map.
    pub cr3: Pa,

    /// Location of the table in the dump, after run adjustment.
    ///
    /// This is the registry key; at most one process exists per offset.
    pub file_offset: u64,

    /// Difference between `file_offset` and `cr3`.
    pub diff: i64,

    /// Confidence tier of the heuristic that matched.
    pub mode: u8,

    /// The detector that produced this record.
    pub kind: PtType,

    /// Kernel-view cluster, for detectors that correlate tables.
    pub group: Option<usize>,

    /// Raw location of the block in the file, before run adjustment.
    pub true_offset: u64,

    /// Non-zero entries of the table, for later page walks.
    pub top_page_table: TopPageTable,
}

impl DetectedProc {
    /// Heuristic tier used by every self-map detector.
    pub const MODE_SELF_MAP: u8 = 2;

    /// Creates a record for a self-map match.
    ///
    /// `diff` is derived from `file_offset` and `cr3`, and the sparse table
    /// is captured from `block`.
    pub fn new(kind: PtType, cr3: Pa, file_offset: u64, true_offset: u64, block: Block) -> Self {
        Self {
            cr3,
            file_offset,
            diff: file_offset.wrapping_sub(cr3.0) as i64,
            mode: Self::MODE_SELF_MAP,
            kind,
            group: None,
            true_offset,
            top_page_table: TopPageTable::from_block(block),
        }
    }

    /// Assigns the record to a kernel-view cluster.
    pub fn with_group(self, group: usize) -> Self {
        Self {
            group: Some(group),
            ..self
        }
    }
}

impl std::fmt::Display for DetectedProc {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} CR3 {} @ 0x{:x} (diff: {}, mode: {}",
            self.kind, self.cr3, self.file_offset, self.diff, self.mode
        )?;

        if let Some(group) = self.group {
            write!(f, ", group: {group}")?;
        }

        write!(f, ", entries: {})", self.top_page_table.len())
    }
}
