//! Prefetch progress types.

use std::sync::{Arc, Mutex};

/// Cumulative progress of one prefetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchProgress {
    /// Response bytes transferred so far, across every HTTP
    /// interaction of the run.
    pub bytes_transferred: u64,
    /// Number of items the run set out to prefetch.
    pub total_partitions_to_prefetch: usize,
    /// Items completed so far: downloaded, found cached, or
    /// attempted-and-failed.
    pub prefetched_partitions: usize,
}

/// Callback invoked after each completed item with cumulative progress.
pub type ProgressCallback = Arc<dyn Fn(PrefetchProgress) + Send + Sync>;

/// Serializes progress updates for one run.
///
/// The mutex is held across the callback invocation, so no two
/// callbacks for the same run ever overlap.
pub(crate) struct ProgressTracker {
    state: Mutex<PrefetchProgress>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            state: Mutex::new(PrefetchProgress {
                bytes_transferred: 0,
                total_partitions_to_prefetch: total,
                prefetched_partitions: 0,
            }),
            callback,
        }
    }

    /// Accounts bytes from a non-item interaction (version or metadata
    /// stages). No callback fires.
    pub(crate) fn add_bytes(&self, bytes: u64) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        state.bytes_transferred += bytes;
    }

    /// Marks one item complete and fires the callback.
    pub(crate) fn complete_one(&self, bytes: u64) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        state.bytes_transferred += bytes;
        state.prefetched_partitions += 1;
        if let Some(callback) = &self.callback {
            callback(*state);
        }
    }

    /// Final cumulative state of the run.
    pub(crate) fn snapshot(&self) -> PrefetchProgress {
        *self.state.lock().expect("progress lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_accumulates_and_reports() {
        let seen: Arc<Mutex<Vec<PrefetchProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |progress| {
            sink.lock().unwrap().push(progress);
        });
        let tracker = ProgressTracker::new(3, Some(callback));

        tracker.add_bytes(10);
        tracker.complete_one(5);
        tracker.complete_one(0);

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].bytes_transferred, 15);
        assert_eq!(events[0].prefetched_partitions, 1);
        assert_eq!(events[1].prefetched_partitions, 2);
        assert_eq!(events[1].total_partitions_to_prefetch, 3);
        assert_eq!(tracker.snapshot().bytes_transferred, 15);
    }

    #[test]
    fn test_tracker_without_callback() {
        let tracker = ProgressTracker::new(1, None);
        tracker.complete_one(7);
        assert_eq!(tracker.snapshot().prefetched_partitions, 1);
        assert_eq!(tracker.snapshot().bytes_transferred, 7);
    }
}
