use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe count of files the extractor has attempted to read.
///
/// Clones share the same cell: the scan worker increments it while the
/// progress reporter reads it from the caller's loop. The storage itself is
/// never exposed.
#[derive(Debug, Clone, Default)]
pub struct FileCounter {
    count: Arc<AtomicU64>,
}

impl FileCounter {
    /// Creates a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more scanned file
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns a snapshot of the current count
    pub fn read(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Sets the count back to zero
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl fmt::Display for FileCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.read())
    }
}
