use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use memmap2::MmapOptions;
use rayon::prelude::*;
use vtero_core::{
    Block, Contiguous, DetectedProc, ENTRIES_PER_TABLE, MemoryRunIndex, ProcessRegistry, PtType,
    VmcsRegistry, VteroError,
};
use zerocopy::IntoBytes;

use crate::{
    BlockLocation, CheckDispatcher, Detector, RunAdjuster, ScanContext, ScanOptions, ScanProgress,
    progress::percent,
};

/// Windowed parallel scanner over a physical memory dump.
///
/// The dump is mapped one window at a time. Each window is copied into two
/// alternating chunk buffers: while the active detectors run over every
/// page of one buffer, the next chunk is copied into the other.
///
/// A scan usually runs twice. The first pass looks for page-table roots
/// with the operating system detectors. The roots it finds are then handed
/// to [`set_vmcs_candidates`], and a second pass with [`PtType::VMCS`]
/// looks for the control structures of the hypervisors running them.
///
/// [`set_vmcs_candidates`]: Self::set_vmcs_candidates
pub struct Scanner {
    path: PathBuf,
    options: ScanOptions,
    dispatcher: CheckDispatcher,
    runs: Box<dyn MemoryRunIndex>,
    vmcs_candidates: Vec<Arc<DetectedProc>>,
    processes: ProcessRegistry,
    vmcs: VmcsRegistry,
    progress: ScanProgress,
}

impl Scanner {
    /// Creates a scanner for the dump at `path`.
    ///
    /// The scanner starts with no active detectors and assumes a dump
    /// without gaps.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options: ScanOptions::default(),
            dispatcher: CheckDispatcher::default(),
            runs: Box::new(Contiguous),
            vmcs_candidates: Vec::new(),
            processes: ProcessRegistry::new(),
            vmcs: VmcsRegistry::new(),
            progress: ScanProgress::new(),
        }
    }

    /// Sets the scan geometry.
    pub fn with_options(self, options: ScanOptions) -> Self {
        Self { options, ..self }
    }

    /// Sets the index used to correct offsets in sparse dumps.
    pub fn with_run_index(self, runs: impl MemoryRunIndex + 'static) -> Self {
        Self {
            runs: Box::new(runs),
            ..self
        }
    }

    /// Sets the scan mode.
    pub fn with_scan_mode(mut self, mode: PtType) -> Self {
        self.set_scan_mode(mode);
        self
    }

    /// Returns the path of the dump.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the scan geometry.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Replaces the scan mode.
    pub fn set_scan_mode(&mut self, mode: PtType) {
        self.dispatcher.set_scan_mode(mode);
        tracing::debug!(%mode, detectors = ?self.dispatcher.active(), "scan mode");
    }

    /// Returns the scan mode.
    pub fn scan_mode(&self) -> PtType {
        self.dispatcher.scan_mode()
    }

    /// Sets the page-table roots the VMCS detector anchors on.
    pub fn set_vmcs_candidates(&mut self, candidates: impl IntoIterator<Item = Arc<DetectedProc>>) {
        self.vmcs_candidates = candidates.into_iter().collect();
    }

    /// Returns the page-table roots found so far.
    pub fn processes(&self) -> &ProcessRegistry {
        &self.processes
    }

    /// Returns the VMCS found so far.
    pub fn vmcs(&self) -> &VmcsRegistry {
        &self.vmcs
    }

    /// Returns a handle on the progress of the current scan.
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Scans the whole dump with the active detectors.
    ///
    /// Stops early once `exit_after` page-table roots are known, checked
    /// after each chunk; zero scans the whole dump. Returns the number of
    /// page-table roots known when the scan ends.
    ///
    /// Detections committed before an error remain in the registries.
    pub fn analyze(&self, exit_after: usize) -> Result<usize, VteroError> {
        self.options.validate()?;
        let detectors = self.dispatcher.instantiate(&self.vmcs_candidates)?;
        self.progress.reset();

        let file = File::open(&self.path)?;
        let file_size = file.metadata()?.len();

        tracing::info!(
            path = %self.path.display(),
            file_size,
            mode = %self.scan_mode(),
            exit_after,
            "scan started"
        );

        if file_size == 0 {
            self.progress.advance(100);
            return Ok(self.processes.len());
        }

        let ctx = ScanContext::new(file_size, &self.processes, &self.vmcs);
        let mut adjuster = RunAdjuster::new(self.runs.as_ref());

        let chunk_size = self.options.chunk_size;
        let mut current = vec![0u64; chunk_size / size_of::<u64>()];
        let mut next = vec![0u64; chunk_size / size_of::<u64>()];

        let mut window_base = 0;
        while window_base < file_size {
            let window_len = (file_size - window_base).min(self.options.window_size as u64) as usize;

            // SAFETY: The dump is opened read-only and is not expected to
            //         change while it is scanned.
            let window = unsafe {
                MmapOptions::new()
                    .offset(window_base)
                    .len(window_len)
                    .map(&file)?
            };

            let chunks: Vec<&[u8]> = window.chunks(chunk_size).collect();
            let Some(first) = chunks.first()
            else {
                break;
            };

            let mut valid = fill_chunk(&mut current, first);

            for index in 0..chunks.len() {
                let chunk_base = window_base + (index * chunk_size) as u64;
                let locations = adjuster.locate_chunk(chunk_base, valid);

                tracing::trace!(chunk_base, valid, "scanning chunk");

                let ((), next_valid) = rayon::join(
                    || scan_chunk(&detectors, &ctx, &current, &locations),
                    || match chunks.get(index + 1) {
                        Some(bytes) => fill_chunk(&mut next, bytes),
                        None => 0,
                    },
                );

                std::mem::swap(&mut current, &mut next);
                valid = next_valid;

                if exit_after > 0 && self.processes.len() >= exit_after {
                    tracing::info!(
                        found = self.processes.len(),
                        offset = chunk_base + chunk_size as u64,
                        "scan stopped early"
                    );
                    return Ok(self.processes.len());
                }
            }

            window_base += window_len as u64;

            if self.progress.advance(percent(window_base, file_size)) {
                tracing::info!(progress = self.progress.get(), "scan progress");
            }
        }

        tracing::info!(
            processes = self.processes.len(),
            vmcs = self.vmcs.len(),
            "scan finished"
        );

        Ok(self.processes.len())
    }
}

/// Copies `bytes` into the head of `buffer` and zeroes the rest.
///
/// Returns the number of bytes copied.
fn fill_chunk(buffer: &mut [u64], bytes: &[u8]) -> usize {
    let target = buffer.as_mut_bytes();
    target[..bytes.len()].copy_from_slice(bytes);
    target[bytes.len()..].fill(0);
    bytes.len()
}

/// Runs every detector over the located pages of a chunk.
///
/// Detectors run in parallel with each other; each one visits the pages
/// in order.
fn scan_chunk(
    detectors: &[Detector],
    ctx: &ScanContext,
    words: &[u64],
    locations: &[BlockLocation],
) {
    detectors.par_iter().for_each(|detector| {
        for (words, &location) in words.chunks_exact(ENTRIES_PER_TABLE).zip(locations) {
            if let Some(block) = Block::new(words) {
                detector.detect(ctx, block, location);
            }
        }
    });
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
