use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

/// Shared, monotonic scan progress in percent.
///
/// Clones observe the same value, so a status display may poll it from
/// another thread while a scan runs.
#[derive(Debug, Default, Clone)]
pub struct ScanProgress(Arc<AtomicU8>);

impl ScanProgress {
    /// Creates a progress counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current percentage.
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Raises the percentage to `percent`, capped at 100.
    ///
    /// Lower values are ignored. Returns `true` if the value changed.
    pub fn advance(&self, percent: u8) -> bool {
        let percent = percent.min(100);
        self.0.fetch_max(percent, Ordering::AcqRel) < percent
    }

    pub(crate) fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }
}

/// Returns `done` as an integer percentage of `total`, rounded down.
pub(crate) fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }

    (u128::from(done.min(total)) * 100 / u128::from(total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases() {
        let progress = ScanProgress::new();
        let observer = progress.clone();

        assert!(progress.advance(10));
        assert!(!progress.advance(5));
        assert_eq!(observer.get(), 10);
        assert!(progress.advance(200));
        assert_eq!(observer.get(), 100);
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(2_999, 3_000), 99);
        assert_eq!(percent(3_000, 3_000), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
