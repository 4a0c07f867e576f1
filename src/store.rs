//! Thread-safe sample accumulator
//!
//! The sample store is the single hand-off point between the link worker
//! thread (producer) and the presentation consumer: a per-channel,
//! time-ordered buffer of decoded values guarded by one lock. The
//! consumer drains it with [`SampleStore::snapshot_and_clear`], which
//! atomically takes everything accumulated since the last call, so no
//! sample is ever delivered twice and the store cannot grow without
//! bound between render ticks.

use crate::protocol::ReportId;
use crate::types::Sample;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-channel accumulated samples, keyed by report channel
pub type SampleBatch = HashMap<ReportId, Vec<Sample>>;

/// Lock-guarded per-channel sample buffers
#[derive(Debug, Default)]
pub struct SampleStore {
    inner: Mutex<SampleBatch>,
}

/// Shared handle to a sample store, cloned across the thread boundary
pub type SharedSampleStore = Arc<SampleStore>;

impl SampleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind a shared handle
    pub fn shared() -> SharedSampleStore {
        Arc::new(Self::new())
    }

    /// Append one sample to a channel's buffer
    pub fn append(&self, channel: ReportId, sample: Sample) {
        let mut inner = self.lock();
        inner.entry(channel).or_default().push(sample);
    }

    /// Atomically take all accumulated samples and clear the store
    ///
    /// Calling this twice in a row with no intervening appends returns an
    /// empty batch the second time.
    pub fn snapshot_and_clear(&self) -> SampleBatch {
        std::mem::take(&mut *self.lock())
    }

    /// Drop all accumulated samples (on disconnect)
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Total number of buffered samples across all channels
    pub fn total_len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Whether the store holds no samples
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SampleBatch> {
        // A poisoned lock only means a panicking thread held it; the
        // sample map itself is always in a consistent state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_snapshot() {
        let store = SampleStore::new();
        store.append(ReportId::Pid1Input, Sample::new(1.0, 0.1));
        store.append(ReportId::Pid1Input, Sample::new(2.0, 0.2));
        store.append(ReportId::Pid2Output, Sample::new(-3.0, 0.2));

        assert_eq!(store.total_len(), 3);

        let batch = store.snapshot_and_clear();
        assert_eq!(batch[&ReportId::Pid1Input].len(), 2);
        assert_eq!(batch[&ReportId::Pid1Input][1].value, 2.0);
        assert_eq!(batch[&ReportId::Pid2Output][0].value, -3.0);
    }

    #[test]
    fn test_snapshot_never_returns_twice() {
        let store = SampleStore::new();
        store.append(ReportId::Pid3Setpoint, Sample::new(5.0, 1.0));

        let first = store.snapshot_and_clear();
        assert_eq!(first.len(), 1);

        let second = store.snapshot_and_clear();
        assert!(second.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_samples_keep_arrival_order() {
        let store = SampleStore::new();
        for i in 0..100 {
            store.append(ReportId::Pid1Output, Sample::new(i as f64, i as f64 / 100.0));
        }

        let batch = store.snapshot_and_clear();
        let values: Vec<f64> = batch[&ReportId::Pid1Output].iter().map(|s| s.value).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_concurrent_append_and_drain() {
        let store = SampleStore::shared();
        let producer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    store.append(ReportId::Pid2Input, Sample::new(i as f64, 0.0));
                }
            })
        };

        let mut drained = 0;
        while drained < 1000 {
            let batch = store.snapshot_and_clear();
            drained += batch.values().map(Vec::len).sum::<usize>();
            std::thread::yield_now();
        }

        producer.join().unwrap();
        assert_eq!(drained, 1000);
        assert!(store.is_empty());
    }
}
