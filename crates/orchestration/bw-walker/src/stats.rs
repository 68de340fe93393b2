//! Statistics for walks.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Cache line size on most modern CPUs (64 bytes).
const CACHE_LINE_SIZE: usize = 64;

/// A cache-line-padded atomic counter.
///
/// Every worker bumps the record counters, so each counter gets its own
/// cache line to avoid false sharing between workers.
#[repr(C, align(64))]
#[derive(Debug)]
struct PaddedAtomicU64 {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
}

impl Default for PaddedAtomicU64 {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
        }
    }
}

impl PaddedAtomicU64 {
    #[inline]
    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn add(&self, val: u64) -> u64 {
        self.value.fetch_add(val, Ordering::Relaxed)
    }
}

/// Statistics collected during a walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    started_at: Option<DateTime<Utc>>,

    /// When the first object was opened
    first_object_at: Mutex<Option<DateTime<Utc>>>,

    /// When the last object was finished
    last_object_at: Mutex<Option<DateTime<Utc>>>,

    objects_listed: PaddedAtomicU64,
    objects_filtered: PaddedAtomicU64,
    objects_opened: PaddedAtomicU64,
    objects_failed: PaddedAtomicU64,

    records_read: PaddedAtomicU64,
    records_matched: PaddedAtomicU64,
    records_delivered: PaddedAtomicU64,
    records_invalid: PaddedAtomicU64,
    records_skipped: PaddedAtomicU64,

    bytes_read: PaddedAtomicU64,

    /// Objects currently open
    open_now: AtomicU64,

    /// Highest value `open_now` has reached
    peak_open: AtomicU64,

    cancelled: AtomicBool,
}

/// Keeps an object counted as open until dropped.
#[must_use]
pub struct OpenGuard<'a> {
    stats: &'a WalkStats,
}

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.stats.open_now.fetch_sub(1, Ordering::AcqRel);
        *self.stats.last_object_at.lock() = Some(Utc::now());
    }
}

impl WalkStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Count an object as open until the returned guard is dropped.
    pub fn open_object(&self) -> OpenGuard<'_> {
        {
            let mut first = self.first_object_at.lock();
            if first.is_none() {
                *first = Some(Utc::now());
            }
        }

        self.objects_opened.add(1);
        let now = self.open_now.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_open.fetch_max(now, Ordering::AcqRel);

        OpenGuard { stats: self }
    }

    /// Record a listed object.
    pub fn record_listed(&self) {
        self.objects_listed.add(1);
    }

    /// Record an object rejected by the object filter.
    pub fn record_filtered(&self) {
        self.objects_filtered.add(1);
    }

    /// Record an object that could not be opened or read to the end.
    pub fn record_object_failure(&self) {
        self.objects_failed.add(1);
    }

    /// Record a decoded record.
    pub fn record_read(&self) {
        self.records_read.add(1);
    }

    /// Record a record accepted by the query set.
    pub fn record_matched(&self) {
        self.records_matched.add(1);
    }

    /// Record a record the callback accepted.
    pub fn record_delivered(&self) {
        self.records_delivered.add(1);
    }

    /// Record an invalid record reported to the callback.
    pub fn record_invalid(&self) {
        self.records_invalid.add(1);
    }

    /// Record an invalid record dropped without reporting.
    pub fn record_skipped(&self) {
        self.records_skipped.add(1);
    }

    /// Record bytes read.
    pub fn record_bytes_read(&self, bytes: u64) {
        self.bytes_read.add(bytes);
    }

    /// Mark the walk as stopped by cancellation.
    pub fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Get the number of objects currently open.
    pub fn open_now(&self) -> u64 {
        self.open_now.load(Ordering::Acquire)
    }

    /// Get the highest number of objects open at once.
    pub fn peak_open(&self) -> u64 {
        self.peak_open.load(Ordering::Acquire)
    }

    /// Get the number of records delivered.
    pub fn records_delivered(&self) -> u64 {
        self.records_delivered.load()
    }

    /// Check if the walk was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: None,
            first_object_at: *self.first_object_at.lock(),
            last_object_at: *self.last_object_at.lock(),
            objects_listed: self.objects_listed.load(),
            objects_filtered: self.objects_filtered.load(),
            objects_opened: self.objects_opened.load(),
            objects_failed: self.objects_failed.load(),
            records_read: self.records_read.load(),
            records_matched: self.records_matched.load(),
            records_delivered: self.records_delivered.load(),
            records_invalid: self.records_invalid.load(),
            records_skipped: self.records_skipped.load(),
            bytes_read: self.bytes_read.load(),
            peak_open: self.peak_open(),
            cancelled: self.is_cancelled(),
        }
    }
}

/// A serializable snapshot of walk statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub first_object_at: Option<DateTime<Utc>>,
    pub last_object_at: Option<DateTime<Utc>>,
    pub objects_listed: u64,
    /// Objects rejected by the object filter
    pub objects_filtered: u64,
    pub objects_opened: u64,
    pub objects_failed: u64,
    pub records_read: u64,
    pub records_matched: u64,
    pub records_delivered: u64,
    pub records_invalid: u64,
    pub records_skipped: u64,
    /// Decompressed bytes
    pub bytes_read: u64,
    /// Highest number of objects open at once
    pub peak_open: u64,
    /// Whether the walk stopped because it was cancelled
    pub cancelled: bool,
}

impl StatsSnapshot {
    /// Get the total duration of the walk.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Get the duration between opening the first object and finishing the last.
    pub fn active_duration(&self) -> Option<Duration> {
        match (self.first_object_at, self.last_object_at) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        }
    }

    /// Records read per second of active time.
    pub fn records_per_second(&self) -> Option<f64> {
        self.active_duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                self.records_read as f64 / secs
            } else {
                0.0
            }
        })
    }

    /// Calculate the read throughput in MB per second of active time.
    pub fn read_throughput_mbps(&self) -> Option<f64> {
        self.active_duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                (self.bytes_read as f64 / 1_000_000.0) / secs
            } else {
                0.0
            }
        })
    }

    /// Add another walk's counters to this one.
    ///
    /// Used to total the walks of several URIs.
    pub fn merge(&mut self, other: &StatsSnapshot) {
        self.started_at = min_time(self.started_at, other.started_at);
        self.first_object_at = min_time(self.first_object_at, other.first_object_at);
        self.completed_at = self.completed_at.max(other.completed_at);
        self.last_object_at = self.last_object_at.max(other.last_object_at);
        self.objects_listed += other.objects_listed;
        self.objects_filtered += other.objects_filtered;
        self.objects_opened += other.objects_opened;
        self.objects_failed += other.objects_failed;
        self.records_read += other.records_read;
        self.records_matched += other.records_matched;
        self.records_delivered += other.records_delivered;
        self.records_invalid += other.records_invalid;
        self.records_skipped += other.records_skipped;
        self.bytes_read += other.bytes_read;
        self.peak_open = self.peak_open.max(other.peak_open);
        self.cancelled |= other.cancelled;
    }
}

fn min_time(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stats_new() {
        let stats = WalkStats::new();
        let snapshot = stats.snapshot();
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.completed_at.is_none());
        assert_eq!(snapshot.objects_opened, 0);
        assert!(!snapshot.cancelled);
    }

    #[test]
    fn test_open_guard_tracks_peak() {
        let stats = WalkStats::new();
        {
            let _a = stats.open_object();
            let _b = stats.open_object();
            assert_eq!(stats.open_now(), 2);
        }
        let _c = stats.open_object();

        assert_eq!(stats.open_now(), 1);
        assert_eq!(stats.peak_open(), 2);
        assert_eq!(stats.snapshot().objects_opened, 3);
    }

    #[test]
    fn test_active_duration_set_by_objects() {
        let stats = WalkStats::new();
        assert!(stats.snapshot().active_duration().is_none());

        drop(stats.open_object());
        let snapshot = stats.snapshot();
        assert!(snapshot.first_object_at.is_some());
        assert!(snapshot.active_duration().is_some());
    }

    #[test]
    fn test_thread_safety() {
        let stats = Arc::new(WalkStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = stats.open_object();
                        stats.record_read();
                        stats.record_delivered();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_read, 800);
        assert_eq!(snapshot.records_delivered, 800);
        assert_eq!(stats.open_now(), 0);
        assert!(snapshot.peak_open >= 1 && snapshot.peak_open <= 8);
    }

    #[test]
    fn test_merge() {
        let mut total = StatsSnapshot {
            records_read: 3,
            peak_open: 2,
            ..Default::default()
        };
        total.merge(&StatsSnapshot {
            records_read: 4,
            peak_open: 5,
            cancelled: true,
            ..Default::default()
        });

        assert_eq!(total.records_read, 7);
        assert_eq!(total.peak_open, 5);
        assert!(total.cancelled);
    }

    #[test]
    fn test_padded_atomic_alignment() {
        assert_eq!(std::mem::align_of::<PaddedAtomicU64>(), 64);
        assert_eq!(std::mem::size_of::<PaddedAtomicU64>(), 64);
    }
}
