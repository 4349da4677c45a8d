use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::{IndexMap, map::Entry};

use crate::{DetectedProc, Vmcs};

/// Concurrent set of detected processes, keyed by file offset.
///
/// Iteration order is discovery order.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    inner: RwLock<IndexMap<u64, Arc<DetectedProc>>>,
}

impl ProcessRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `process` unless a record already exists at its file offset.
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert(&self, process: DetectedProc) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        match inner.entry(process.file_offset) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(process));
                true
            }
        }
    }

    /// Checks if a record exists at `file_offset`.
    pub fn contains(&self, file_offset: u64) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&file_offset)
    }

    /// Returns the record at `file_offset`.
    pub fn get(&self, file_offset: u64) -> Option<Arc<DetectedProc>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&file_offset)
            .cloned()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Checks if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every record in discovery order.
    pub fn snapshot(&self) -> Vec<Arc<DetectedProc>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

/// Concurrent append-only collection of detected VMCS pages.
#[derive(Debug, Default)]
pub struct VmcsRegistry {
    inner: Mutex<Vec<Vmcs>>,
}

impl VmcsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&self, vmcs: Vmcs) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(vmcs);
    }

    /// Appends every record of `vmcs` under one lock.
    pub fn extend(&self, vmcs: impl IntoIterator<Item = Vmcs>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(vmcs);
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Checks if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of every record.
    pub fn snapshot(&self) -> Vec<Vmcs> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
