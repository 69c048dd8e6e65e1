pub mod stream;

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::sampler::Sample;

/// Bounded, time-ordered retention of recent samples, oldest first.
///
/// The sampler task is the only writer. Request handlers read through
/// `latest()` / `snapshot()`, which clone under a short-held lock, so a
/// reader can never observe a sample that is still being appended.
pub struct HistoryBuffer {
    inner: Mutex<VecDeque<Sample>>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Capacity is fixed for the lifetime of the buffer.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    /// Push to the back; at capacity the oldest entry is evicted.
    pub fn append(&self, sample: Sample) {
        let mut buf = self.inner.lock();
        buf.push_back(sample);
        if buf.len() > self.capacity {
            buf.pop_front();
        }
    }

    /// The most recent sample, or `None` before the first tick lands.
    pub fn latest(&self) -> Option<Sample> {
        self.inner.lock().back().cloned()
    }

    /// Copy-on-read view of the whole window, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sampler::testutil::{marked_sample_at, sample_at};

    #[test]
    fn empty_buffer_has_no_latest_and_empty_snapshot() {
        let buf = HistoryBuffer::new(3);
        assert!(buf.latest().is_none());
        assert!(buf.snapshot().is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn append_at_capacity_evicts_exactly_the_oldest() {
        let buf = HistoryBuffer::new(3);
        for secs in [1, 2, 3, 4] {
            buf.append(sample_at(secs));
        }

        let snap = buf.snapshot();
        let times: Vec<i64> = snap.iter().map(|s| s.timestamp.timestamp()).collect();
        // A, B, C, D into capacity 3 → [B, C, D].
        assert_eq!(times, vec![2, 3, 4]);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let buf = HistoryBuffer::new(5);
        for secs in 0..200 {
            buf.append(sample_at(secs));
            assert!(buf.len() <= buf.capacity());
        }
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn snapshot_is_oldest_first_with_non_decreasing_timestamps() {
        let buf = HistoryBuffer::new(10);
        for secs in [5, 5, 6, 9] {
            buf.append(sample_at(secs));
        }
        let snap = buf.snapshot();
        assert!(snap
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(buf.latest().unwrap().timestamp.timestamp(), 9);
    }

    #[test]
    fn snapshot_is_a_copy_not_a_view() {
        let buf = HistoryBuffer::new(3);
        buf.append(sample_at(1));
        let snap = buf.snapshot();
        buf.append(sample_at(2));
        assert_eq!(snap.len(), 1);
    }

    /// One writer, several readers. Every sample carries the same
    /// marker through multiple fields; a torn read would surface as a
    /// mismatch between them.
    #[test]
    fn concurrent_readers_never_see_a_torn_sample() {
        let buf = Arc::new(HistoryBuffer::new(8));

        let writer = {
            let buf = Arc::clone(&buf);
            std::thread::spawn(move || {
                for i in 0..1_000u64 {
                    buf.append(marked_sample_at(i as i64, i));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let buf = Arc::clone(&buf);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        for s in buf.snapshot() {
                            assert_eq!(s.memory.used, s.uptime_secs);
                            assert_eq!(s.cpu.percent, s.uptime_secs as f32);
                        }
                        assert!(buf.len() <= buf.capacity());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
