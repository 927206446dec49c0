//! Atomically replaced snapshots.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Holds an immutable snapshot that writers replace as a whole.
///
/// Readers clone the current `Arc` and never see a half-written value.
/// Writers queue on a dedicated mutex, compute the next value from the
/// current one without holding the read lock, then swap the pointer.
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
    writer: Mutex<()>,
}

impl<T> SnapshotCell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<T> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `value` as the new snapshot.
    pub fn store(&self, value: T) {
        let _queued = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap(value);
    }

    /// Read-compute-replace.
    ///
    /// `f` receives the current snapshot and returns the next one together
    /// with a result. On `Err` nothing is installed.
    pub fn update<R, E>(&self, f: impl FnOnce(&T) -> Result<(T, R), E>) -> Result<R, E> {
        let _queued = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, out) = f(&self.load())?;
        self.swap(next);
        Ok(out)
    }

    fn swap(&self, value: T) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(value);
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
