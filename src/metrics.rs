//! Opt-in operation counters, compiled under `feature = "metrics"`.
//!
//! Each policy instance owns a [`PolicyMetrics`] and bumps it from its own
//! public surface: get calls and hits, insert calls, remove calls, and (for
//! LRU, whose add path reports it) capacity evictions. Counters are relaxed
//! atomics so read-lock operations can record without promoting to the
//! write lock; totals are monotonic but a snapshot taken mid-operation may
//! be ahead or behind by a call.
//!
//! ## Example Usage
//!
//! ```
//! use xlru::policy::lru::LruCache;
//!
//! let cache: LruCache<String, u32> = LruCache::new(16, None).unwrap();
//! cache.add("a".into(), 1);
//! cache.get(&"a".into());
//! cache.get(&"b".into());
//!
//! let m = cache.metrics();
//! assert_eq!(m.get_calls, 2);
//! assert_eq!(m.get_hits, 1);
//! assert_eq!(m.get_misses, 1);
//! assert_eq!(m.insert_calls, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a policy instance.
#[derive(Debug, Default)]
pub struct PolicyMetrics {
    get_calls: AtomicU64,
    get_hits: AtomicU64,
    insert_calls: AtomicU64,
    remove_calls: AtomicU64,
    evicted_entries: AtomicU64,
}

impl PolicyMetrics {
    pub(crate) fn record_get(&self, hit: bool) {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.get_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_insert(&self) {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Insert that also reported whether it pushed the oldest entry out.
    pub(crate) fn record_insert_evicted(&self, evicted: bool) {
        self.record_insert();
        if evicted {
            self.evicted_entries.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_remove(&self) {
        self.remove_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters out, pairing them with gauges sampled by the
    /// caller.
    pub(crate) fn snapshot(&self, len: usize, capacity: usize) -> MetricsSnapshot {
        let get_calls = self.get_calls.load(Ordering::Relaxed);
        let get_hits = self.get_hits.load(Ordering::Relaxed);
        MetricsSnapshot {
            get_calls,
            get_hits,
            get_misses: get_calls.saturating_sub(get_hits),
            insert_calls: self.insert_calls.load(Ordering::Relaxed),
            remove_calls: self.remove_calls.load(Ordering::Relaxed),
            evicted_entries: self.evicted_entries.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }
}

/// Point-in-time copy of a policy's counters and size gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub insert_calls: u64,
    pub remove_calls: u64,
    /// Capacity-pressure evictions observed on the add path. Only the LRU
    /// policy reports these; composite policies leave it at zero.
    pub evicted_entries: u64,
    pub len: usize,
    pub capacity: usize,
}
