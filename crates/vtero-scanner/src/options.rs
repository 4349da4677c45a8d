use serde::{Deserialize, Serialize};
use vtero_core::{PAGE_SIZE, VteroError};

/// Geometry of the windowed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Size of each read-only mapping of the dump, in bytes.
    pub window_size: usize,

    /// Size of each double-buffered chunk, in bytes.
    pub chunk_size: usize,
}

impl ScanOptions {
    /// Default window size (64 MiB).
    pub const DEFAULT_WINDOW_SIZE: usize = 64 * 1024 * 1024;

    /// Default chunk size (2 MiB, 512 pages).
    pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

    /// Sets the window size.
    pub fn with_window_size(self, window_size: usize) -> Self {
        Self {
            window_size,
            ..self
        }
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self { chunk_size, ..self }
    }

    /// Checks the geometry.
    ///
    /// The chunk size must be a non-zero multiple of the page size and the
    /// window size a non-zero multiple of the chunk size.
    pub fn validate(&self) -> Result<(), VteroError> {
        if self.chunk_size == 0 || self.chunk_size % PAGE_SIZE as usize != 0 {
            return Err(VteroError::InvalidOptions(
                "chunk size must be a non-zero multiple of the page size",
            ));
        }

        if self.window_size == 0 || self.window_size % self.chunk_size != 0 {
            return Err(VteroError::InvalidOptions(
                "window size must be a non-zero multiple of the chunk size",
            ));
        }

        Ok(())
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Geometry of the backward value scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackwardScanOptions {
    /// Size of each chunk read from the tail toward the head, in bytes.
    pub chunk_size: usize,
}

impl BackwardScanOptions {
    /// Default chunk size (8 MiB).
    pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

    /// Sets the chunk size.
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Checks that the chunk size is a non-zero multiple of 8 bytes.
    pub fn validate(&self) -> Result<(), VteroError> {
        if self.chunk_size == 0 || self.chunk_size % size_of::<u64>() != 0 {
            return Err(VteroError::InvalidOptions(
                "chunk size must be a non-zero multiple of 8 bytes",
            ));
        }

        Ok(())
    }
}

impl Default for BackwardScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}
