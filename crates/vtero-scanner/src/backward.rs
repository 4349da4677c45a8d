use std::{fs::File, path::Path};

use memmap2::Mmap;
use vtero_core::VteroError;

use crate::{BackwardScanOptions, ScanProgress, progress::percent};

/// A value searched by [`BackwardValueScan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanValue {
    /// A little-endian 4-byte value, matched at 4-byte granularity.
    Dword(u32),

    /// A little-endian 8-byte value, matched at 8-byte granularity.
    Qword(u64),
}

impl ScanValue {
    /// Returns the width of the value, in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Dword(_) => size_of::<u32>(),
            Self::Qword(_) => size_of::<u64>(),
        }
    }

    fn matches(self, bytes: &[u8]) -> bool {
        match self {
            Self::Dword(value) => <[u8; 4]>::try_from(bytes)
                .map(u32::from_le_bytes)
                .is_ok_and(|found| found == value),
            Self::Qword(value) => <[u8; 8]>::try_from(bytes)
                .map(u64::from_le_bytes)
                .is_ok_and(|found| found == value),
        }
    }
}

/// Lazy search for a value from the end of a file toward its start.
///
/// The file is mapped read-only and consumed in chunks, tail first. Matches
/// are yielded in descending offset order. Once exhausted or stopped, the
/// scan cannot be resumed; create a new one to search again.
pub struct BackwardValueScan {
    mmap: Option<Mmap>,
    value: ScanValue,
    exit_after: usize,
    options: BackwardScanOptions,

    /// End of the part of the file not scanned yet.
    cursor: usize,

    /// Matches of the last chunk, ascending, consumed from the back.
    pending: Vec<u64>,
    yielded: usize,
    progress: ScanProgress,
}

impl BackwardValueScan {
    /// Opens `path` for a backward search of `value`.
    ///
    /// A non-zero `exit_after` ends the search after that many matches.
    pub fn new(path: impl AsRef<Path>, value: ScanValue, exit_after: usize) -> Result<Self, VteroError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len() as usize;

        let mmap = match file_size {
            0 => None,
            // SAFETY: The file is opened read-only and is not expected to
            //         change while it is scanned.
            _ => Some(unsafe { Mmap::map(&file)? }),
        };

        tracing::debug!(path = %path.display(), file_size, ?value, exit_after, "backward scan");

        let progress = ScanProgress::new();
        if file_size == 0 {
            progress.advance(100);
        }

        Ok(Self {
            mmap,
            value,
            exit_after,
            options: BackwardScanOptions::default(),
            cursor: file_size,
            pending: Vec::new(),
            yielded: 0,
            progress,
        })
    }

    /// Sets the chunk geometry.
    pub fn with_options(self, options: BackwardScanOptions) -> Result<Self, VteroError> {
        options.validate()?;
        Ok(Self { options, ..self })
    }

    /// Returns a handle on the share of the file consumed so far.
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Returns the size of the scanned file, in bytes.
    pub fn file_size(&self) -> u64 {
        self.mmap.as_ref().map_or(0, |mmap| mmap.len() as u64)
    }

    /// Scans the chunk below the cursor and moves the cursor to its start.
    fn next_chunk(&mut self) -> Option<Vec<u64>> {
        let mmap = self.mmap.as_ref()?;
        if self.cursor == 0 {
            return None;
        }

        let file_size = mmap.len();
        let chunk_size = self.options.chunk_size;
        let start = (self.cursor - 1) / chunk_size * chunk_size;
        let width = self.value.width();
        let value = self.value;

        let matches = mmap[start..self.cursor]
            .chunks_exact(width)
            .enumerate()
            .filter(|(_, bytes)| value.matches(bytes))
            .map(|(index, _)| (start + index * width) as u64)
            .collect();

        tracing::trace!(start, end = self.cursor, "backward chunk");

        self.cursor = start;
        self.progress
            .advance(percent((file_size - start) as u64, file_size as u64));

        Some(matches)
    }
}

impl Iterator for BackwardValueScan {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exit_after > 0 && self.yielded >= self.exit_after {
                return None;
            }

            if let Some(offset) = self.pending.pop() {
                self.yielded += 1;
                return Some(offset);
            }

            self.pending = self.next_chunk()?;
        }
    }
}

#[cfg(test)]
#[path = "backward_tests.rs"]
mod tests;
