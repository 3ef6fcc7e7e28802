//! Two-queue (2Q) cache: recent/frequent split with a ghost list.
//!
//! 2Q improves on plain LRU by keeping entries seen exactly once apart from
//! entries seen repeatedly, so a burst of one-hit traffic cannot flush the
//! frequently used working set. It composes three [`RecencyList`]s:
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                     TwoQueueCore<K, V>                       │
//!   │                                                              │
//!   │   recent        first-touch entries        capacity: size    │
//!   │   frequent      promoted (re-touched)      capacity: size    │
//!   │   recent_evict  ghost keys, no values      capacity:         │
//!   │                                            size * ghost_ratio│
//!   │                                                              │
//!   │   invariant: recent.len + frequent.len <= size               │
//!   └──────────────────────────────────────────────────────────────┘
//!
//!   first add ──────────────► recent
//!   get / re-add on recent ─► frequent        (promotion)
//!   evicted from recent ────► recent_evict    (key only)
//!   add on ghost hit ───────► frequent        (proven reuse)
//! ```
//!
//! A ghost hit means the key was evicted from `recent` and came back while
//! its ghost was still remembered: strong evidence it belongs with the
//! frequent set. The `ensure_space` victim selection biases the freed slot
//! accordingly: on a ghost hit `recent` is allowed to sit at its target
//! size and the victim comes from `frequent` instead.
//!
//! Promotions triggered by `get` move the entry with
//! [`RecencyList::peek_with_deadline`] / `add_with_deadline`, so a deadline
//! set at insert survives the transfer between lists.
//!
//! [`TwoQueueCore`] is the single-threaded policy; [`TwoQueueCache`] wraps
//! it in a `parking_lot::RwLock` (write for `get`/`add`/`remove`/`purge`,
//! read for `peek`/`contains`/`len`/`keys`).

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::ds::recency_list::RecencyList;
use crate::error::ConfigError;
use crate::expiry::Expiry;
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, PolicyMetrics};

/// Share of the cache dedicated to entries seen only once.
pub const DEFAULT_RECENT_RATIO: f64 = 0.25;

/// Share of the cache size remembered as ghost keys after eviction from
/// the recent queue.
pub const DEFAULT_GHOST_RATIO: f64 = 0.50;

/// Single-threaded 2Q policy core.
///
/// Exposes the same operations as [`TwoQueueCache`] minus the lock, plus
/// white-box accessors ([`recent_len`](Self::recent_len),
/// [`frequent_len`](Self::frequent_len), [`ghost_len`](Self::ghost_len))
/// for tests and diagnostics.
pub struct TwoQueueCore<K, V> {
    size: usize,
    recent_size: usize,

    recent: RecencyList<K, V>,
    frequent: RecencyList<K, V>,
    recent_evict: RecencyList<K, ()>,
}

impl<K, V> TwoQueueCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a 2Q core.
    ///
    /// Fails with [`ConfigError::InvalidSize`] when `size` is zero (or when
    /// `ghost_ratio` rounds the ghost list down to zero capacity), and with
    /// the ratio errors when a ratio falls outside `[0.0, 1.0]`.
    pub fn new(
        size: usize,
        recent_ratio: f64,
        ghost_ratio: f64,
        default_ttl: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::InvalidSize);
        }
        if !(0.0..=1.0).contains(&recent_ratio) {
            return Err(ConfigError::InvalidRecentRatio);
        }
        if !(0.0..=1.0).contains(&ghost_ratio) {
            return Err(ConfigError::InvalidGhostRatio);
        }

        let recent_size = (size as f64 * recent_ratio) as usize;
        let ghost_size = (size as f64 * ghost_ratio) as usize;

        Ok(Self {
            size,
            recent_size,
            recent: RecencyList::new(size, None, default_ttl)?,
            frequent: RecencyList::new(size, None, default_ttl)?,
            recent_evict: RecencyList::new(ghost_size, None, None)?,
        })
    }

    /// Looks up a key. A hit in `recent` promotes the entry to `frequent`,
    /// carrying its deadline along.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.frequent.get(key) {
            return Some(value.clone());
        }

        if let Some((value, deadline)) = self
            .recent
            .peek_with_deadline(key)
            .map(|(v, d)| (v.clone(), d))
        {
            self.recent.remove(key);
            self.frequent.add_with_deadline(key.clone(), value.clone(), deadline);
            return Some(value);
        }

        None
    }

    /// Adds a never-expiring entry.
    pub fn add(&mut self, key: K, value: V) {
        self.add_with_expire(key, value, Expiry::Never);
    }

    /// Adds an entry with the given lifetime.
    ///
    /// A key already in `frequent` is updated in place; a key in `recent`
    /// is promoted; a ghost hit goes straight to `frequent`; anything else
    /// starts out in `recent`.
    pub fn add_with_expire(&mut self, key: K, value: V, expiry: Expiry) {
        if self.frequent.contains(&key) {
            self.frequent.add_with_expire(key, value, expiry);
            return;
        }

        if self.recent.contains(&key) {
            self.recent.remove(&key);
            self.frequent.add_with_expire(key, value, expiry);
            return;
        }

        if self.recent_evict.contains(&key) {
            self.ensure_space(true);
            self.recent_evict.remove(&key);
            self.frequent.add_with_expire(key, value, expiry);
            return;
        }

        self.ensure_space(false);
        self.recent.add_with_expire(key, value, expiry);
    }

    /// Frees one live slot if the cache is full.
    ///
    /// The victim comes from `recent` while it is above its target size;
    /// at exactly the target the tie goes to `recent` only when the free
    /// slot is for a fresh key. Keys evicted from `recent` are remembered
    /// in the ghost list; `frequent` victims are not.
    fn ensure_space(&mut self, ghost_hit: bool) {
        let recent_len = self.recent.len();
        let frequent_len = self.frequent.len();
        if recent_len + frequent_len < self.size {
            return;
        }

        if recent_len > 0
            && (recent_len > self.recent_size
                || (recent_len == self.recent_size && !ghost_hit))
        {
            if let Some((key, _)) = self.recent.pop_oldest() {
                self.recent_evict.add(key, ());
            }
            return;
        }

        self.frequent.pop_oldest();
    }

    /// Removes a key from whichever list holds it, ghosts included.
    pub fn remove(&mut self, key: &K) {
        if self.frequent.remove(key).is_some() {
            return;
        }
        if self.recent.remove(key).is_some() {
            return;
        }
        self.recent_evict.remove(key);
    }

    /// Returns `true` if the key is live (ghosts do not count).
    pub fn contains(&self, key: &K) -> bool {
        self.frequent.contains(key) || self.recent.contains(key)
    }

    /// Looks up a key without promoting or reordering.
    pub fn peek(&self, key: &K) -> Option<V> {
        if let Some(value) = self.frequent.peek(key) {
            return Some(value.clone());
        }
        self.recent.peek(key).cloned()
    }

    /// Live keys: `frequent`'s oldest to newest, then `recent`'s.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = self.frequent.keys();
        keys.extend(self.recent.keys());
        keys
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.recent.len() + self.frequent.len()
    }

    /// Returns `true` if no live entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Entries currently in the recent (one-touch) queue.
    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }

    /// Entries currently in the frequent (promoted) queue.
    pub fn frequent_len(&self) -> usize {
        self.frequent.len()
    }

    /// Ghost keys currently remembered.
    pub fn ghost_len(&self) -> usize {
        self.recent_evict.len()
    }

    /// Empties all three lists.
    pub fn purge(&mut self) {
        self.recent.purge();
        self.frequent.purge();
        self.recent_evict.purge();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.recent.debug_validate_invariants();
        self.frequent.debug_validate_invariants();
        self.recent_evict.debug_validate_invariants();
        assert!(self.recent.len() + self.frequent.len() <= self.size);

        // Live-list disjointness. Holds for every reachable state without
        // expired stragglers (an expired resident of `frequent` can be
        // shadowed by a fresh re-add into `recent`).
        let frequent: std::collections::HashSet<_> = self.frequent.keys().into_iter().collect();
        for key in self.recent.keys() {
            assert!(!frequent.contains(&key), "key live in both 2Q queues");
        }
    }
}

impl<K, V> fmt::Debug for TwoQueueCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoQueueCore")
            .field("size", &self.size)
            .field("recent_size", &self.recent_size)
            .field("recent_len", &self.recent.len())
            .field("frequent_len", &self.frequent.len())
            .field("ghost_len", &self.recent_evict.len())
            .finish()
    }
}

/// Fixed-size, thread-safe 2Q cache.
///
/// # Example
///
/// ```
/// use xlru::policy::two_q::TwoQueueCache;
///
/// let cache: TwoQueueCache<String, u32> = TwoQueueCache::new(128, None).unwrap();
/// cache.add("a".into(), 1);
///
/// // The first get promotes "a" from the recent to the frequent queue.
/// assert_eq!(cache.get(&"a".into()).as_deref(), Some(&1));
/// assert_eq!(cache.len(), 1);
/// ```
pub struct TwoQueueCache<K, V> {
    inner: RwLock<TwoQueueCore<K, Arc<V>>>,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> TwoQueueCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a 2Q cache with the default recent and ghost ratios.
    pub fn new(size: usize, default_ttl: Option<Duration>) -> Result<Self, ConfigError> {
        Self::with_params(size, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, default_ttl)
    }

    /// Creates a 2Q cache with explicit ratios. Both must lie in
    /// `[0.0, 1.0]`.
    pub fn with_params(
        size: usize,
        recent_ratio: f64,
        ghost_ratio: f64,
        default_ttl: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: RwLock::new(TwoQueueCore::new(
                size,
                recent_ratio,
                ghost_ratio,
                default_ttl,
            )?),
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::default(),
        })
    }

    /// Looks up a key, promoting a recent entry to the frequent queue.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.inner.write().get(key);
        #[cfg(feature = "metrics")]
        self.metrics.record_get(value.is_some());
        value
    }

    /// Adds a never-expiring entry.
    pub fn add(&self, key: K, value: V) {
        self.add_with_expire(key, value, Expiry::Never);
    }

    /// Adds an entry with the given lifetime.
    pub fn add_with_expire(&self, key: K, value: V, expiry: Expiry) {
        self.inner.write().add_with_expire(key, Arc::new(value), expiry);
        #[cfg(feature = "metrics")]
        self.metrics.record_insert();
    }

    /// Removes a key from whichever list holds it.
    pub fn remove(&self, key: &K) {
        self.inner.write().remove(key);
        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
    }

    /// Returns `true` if the key is live. Does not promote.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    /// Looks up a key without promoting or reordering.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.read().peek(key)
    }

    /// Live keys: frequent queue oldest to newest, then recent queue.
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no live entries are resident.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Empties the cache, ghosts included.
    pub fn purge(&self) {
        self.inner.write().purge();
    }

    /// Copies out this instance's operation counters.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> MetricsSnapshot {
        let inner = self.inner.read();
        self.metrics.snapshot(inner.len(), inner.capacity())
    }
}

impl<K, V> fmt::Debug for TwoQueueCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TwoQueueCache")
            .field("len", &inner.len())
            .field("capacity", &inner.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            TwoQueueCache::<String, i32>::new(0, None).unwrap_err(),
            ConfigError::InvalidSize
        );
        assert_eq!(
            TwoQueueCache::<String, i32>::with_params(8, -0.1, 0.5, None).unwrap_err(),
            ConfigError::InvalidRecentRatio
        );
        assert_eq!(
            TwoQueueCache::<String, i32>::with_params(8, 0.25, 1.5, None).unwrap_err(),
            ConfigError::InvalidGhostRatio
        );
        assert_eq!(
            TwoQueueCache::<String, i32>::with_params(8, f64::NAN, 0.5, None).unwrap_err(),
            ConfigError::InvalidRecentRatio
        );
    }

    #[test]
    fn get_promotes_recent_to_frequent() {
        let mut core: TwoQueueCore<String, i32> =
            TwoQueueCore::new(128, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None).unwrap();

        for i in 0..128 {
            core.add(i.to_string(), i);
        }
        assert_eq!(core.recent_len(), 128);
        assert_eq!(core.frequent_len(), 0);

        for i in 0..128 {
            assert!(core.get(&i.to_string()).is_some());
        }
        assert_eq!(core.recent_len(), 0);
        assert_eq!(core.frequent_len(), 128);

        // A second pass of gets stays within the frequent queue.
        for i in 0..128 {
            assert!(core.get(&i.to_string()).is_some());
        }
        assert_eq!(core.recent_len(), 0);
        assert_eq!(core.frequent_len(), 128);
        core.debug_validate_invariants();
    }

    #[test]
    fn re_add_promotes_recent_to_frequent() {
        let mut core: TwoQueueCore<String, i32> =
            TwoQueueCore::new(128, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None).unwrap();

        core.add("1".into(), 1);
        assert_eq!(core.recent_len(), 1);
        assert_eq!(core.frequent_len(), 0);

        core.add("1".into(), 1);
        assert_eq!(core.recent_len(), 0);
        assert_eq!(core.frequent_len(), 1);

        core.add("1".into(), 1);
        assert_eq!(core.recent_len(), 0);
        assert_eq!(core.frequent_len(), 1);
    }

    #[test]
    fn ghost_hit_promotes_and_biases_eviction() {
        let mut core: TwoQueueCore<String, i32> =
            TwoQueueCore::new(4, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None).unwrap();

        for i in 1..=5 {
            core.add(i.to_string(), i);
        }
        assert_eq!(core.recent_len(), 4);
        assert_eq!(core.ghost_len(), 1);
        assert_eq!(core.frequent_len(), 0);

        // "1" was evicted into the ghost list; re-adding it lands in the
        // frequent queue.
        core.add("1".into(), 1);
        assert_eq!(core.recent_len(), 3);
        assert_eq!(core.ghost_len(), 1);
        assert_eq!(core.frequent_len(), 1);

        // A fresh key evicts from recent again.
        core.add("6".into(), 6);
        assert_eq!(core.recent_len(), 3);
        assert_eq!(core.ghost_len(), 2);
        assert_eq!(core.frequent_len(), 1);
        core.debug_validate_invariants();
    }

    #[test]
    fn eviction_expiry_and_purge_round_trip() {
        let cache: TwoQueueCache<String, i32> = TwoQueueCache::new(128, None).unwrap();

        for i in 0..256 {
            cache.add(i.to_string(), i);
        }
        assert_eq!(cache.len(), 128);

        for (i, k) in cache.keys().into_iter().enumerate() {
            let v = cache.get(&k).unwrap();
            assert_eq!(v.to_string(), k);
            assert_eq!(*v as usize, i + 128);
        }
        for i in 0..128 {
            assert!(cache.get(&i.to_string()).is_none());
        }
        for i in 128..256 {
            assert!(cache.get(&i.to_string()).is_some());
        }
        for i in 128..192 {
            cache.remove(&i.to_string());
            assert!(cache.get(&i.to_string()).is_none());
        }

        cache.add_with_expire("256".into(), 256, Expiry::After(Duration::from_millis(50)));
        assert_eq!(cache.get(&"256".into()).as_deref(), Some(&256));
        sleep(Duration::from_millis(120));
        assert!(cache.get(&"256".into()).is_none());

        cache.purge();
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&"200".into()).is_none());
    }

    #[test]
    fn contains_does_not_promote() {
        let cache: TwoQueueCache<String, i32> = TwoQueueCache::new(2, None).unwrap();
        cache.add("1".into(), 1);
        cache.add("2".into(), 2);
        assert!(cache.contains(&"1".into()));

        cache.add("3".into(), 3);
        assert!(!cache.contains(&"1".into()));
    }

    #[test]
    fn peek_does_not_promote() {
        let cache: TwoQueueCache<String, i32> = TwoQueueCache::new(2, None).unwrap();
        cache.add("1".into(), 1);
        cache.add("2".into(), 2);
        assert_eq!(cache.peek(&"1".into()).as_deref(), Some(&1));

        cache.add("3".into(), 3);
        assert!(!cache.contains(&"1".into()));
    }

    #[test]
    fn promotion_preserves_deadline() {
        let mut core: TwoQueueCore<String, i32> =
            TwoQueueCore::new(8, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None).unwrap();

        core.add_with_expire("k".into(), 1, Expiry::After(Duration::from_millis(50)));
        // Promote out of recent; the deadline must ride along.
        assert_eq!(core.get(&"k".into()), Some(1));
        assert_eq!(core.frequent_len(), 1);

        sleep(Duration::from_millis(120));
        assert_eq!(core.get(&"k".into()), None);
    }

    #[test]
    fn keys_lists_frequent_then_recent() {
        let mut core: TwoQueueCore<String, i32> =
            TwoQueueCore::new(8, DEFAULT_RECENT_RATIO, DEFAULT_GHOST_RATIO, None).unwrap();
        core.add("a".into(), 1);
        core.add("b".into(), 2);
        core.get(&"a".into()); // a -> frequent

        assert_eq!(core.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
