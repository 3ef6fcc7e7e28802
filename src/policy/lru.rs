//! Thread-safe LRU cache with per-entry expiration.
//!
//! The thinnest of the three policies: one [`RecencyList`] behind a
//! `parking_lot::RwLock`. The list supplies the ordering, expiration and
//! eviction-callback mechanics; this layer adds locking, `Arc<V>` value
//! handles, and the atomic `contains_or_add` idiom.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────┐
//!   │                  LruCache<K, V>                     │
//!   │                                                     │
//!   │   ┌───────────────────────────────────────────────┐ │
//!   │   │      RwLock<RecencyList<K, Arc<V>>>           │ │
//!   │   │                                               │ │
//!   │   │   head ──► [MRU] ◄──► ... ◄──► [LRU] ◄── tail │ │
//!   │   └───────────────────────────────────────────────┘ │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! Values are stored as `Arc<V>`, so `get`/`peek` hand out owned handles
//! without requiring `V: Clone` and without holding the lock while the
//! caller uses the value.
//!
//! ## Locking
//!
//! | Operation | Lock | Why |
//! |---|---|---|
//! | `get` | write | a hit moves the entry to the front |
//! | `add`, `add_with_expire` | write | mutates list and index |
//! | `contains_or_add` | write | atomic check-then-insert |
//! | `remove`, `pop_oldest`, `purge` | write | mutates list and index |
//! | `peek`, `peek_oldest` | read | no reordering |
//! | `contains`, `len`, `is_empty`, `keys` | read | no reordering |
//!
//! The eviction callback runs inside the write-lock critical section; it
//! must not call back into the same cache.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::ds::recency_list::{EvictCallback, RecencyList};
use crate::error::ConfigError;
use crate::expiry::Expiry;
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, PolicyMetrics};

/// Fixed-size, thread-safe LRU cache.
///
/// # Example
///
/// ```
/// use xlru::policy::lru::LruCache;
///
/// let cache: LruCache<String, u32> = LruCache::new(2, None).unwrap();
/// cache.add("a".into(), 1);
/// cache.add("b".into(), 2);
///
/// // Touch "a" so "b" is now the eviction candidate.
/// assert_eq!(cache.get(&"a".into()).as_deref(), Some(&1));
///
/// assert!(cache.add("c".into(), 3));
/// assert!(!cache.contains(&"b".into()));
/// assert!(cache.contains(&"a".into()));
/// ```
pub struct LruCache<K, V> {
    inner: RwLock<RecencyList<K, Arc<V>>>,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `size` entries, with `default_ttl`
    /// applied to entries added via [`Expiry::Default`].
    pub fn new(size: usize, default_ttl: Option<Duration>) -> Result<Self, ConfigError> {
        Self::build(size, None, default_ttl)
    }

    /// Like [`new`](Self::new), with a callback observing every entry that
    /// leaves the cache through capacity pressure, [`remove`](Self::remove),
    /// [`pop_oldest`](Self::pop_oldest) or [`purge`](Self::purge).
    ///
    /// The callback is never invoked for entries that merely expire; those
    /// surface as `get` misses and are reclaimed by later capacity
    /// pressure.
    pub fn with_evict(
        size: usize,
        default_ttl: Option<Duration>,
        on_evict: EvictCallback<K, Arc<V>>,
    ) -> Result<Self, ConfigError> {
        Self::build(size, Some(on_evict), default_ttl)
    }

    fn build(
        size: usize,
        on_evict: Option<EvictCallback<K, Arc<V>>>,
        default_ttl: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: RwLock::new(RecencyList::new(size, on_evict, default_ttl)?),
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::default(),
        })
    }

    /// Adds a never-expiring entry. Returns `true` if the insert evicted
    /// the least recently used entry.
    pub fn add(&self, key: K, value: V) -> bool {
        self.add_with_expire(key, value, Expiry::Never)
    }

    /// Adds an entry with the given lifetime. Returns `true` if an eviction
    /// occurred.
    ///
    /// Re-adding a present key updates its value and recency but retains
    /// the deadline it was first inserted with; remove the key first to
    /// re-arm it.
    pub fn add_with_expire(&self, key: K, value: V, expiry: Expiry) -> bool {
        let evicted = self.inner.write().add_with_expire(key, Arc::new(value), expiry);
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_evicted(evicted);
        evicted
    }

    /// Looks up a key, marking it most recently used. Expired entries are
    /// reported as misses.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.inner.write().get(key).cloned();
        #[cfg(feature = "metrics")]
        self.metrics.record_get(value.is_some());
        value
    }

    /// Looks up a key without updating recency. Ignores expiration.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.read().peek(key).cloned()
    }

    /// Returns `true` if the key is present and not expired, without
    /// updating recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    /// Checks for the key and, only if absent, adds it — atomically under
    /// one lock acquisition, closing the check-then-insert race between
    /// concurrent callers.
    ///
    /// Returns `(contained, evicted)`: `(true, false)` when the key was
    /// already present (recency untouched), otherwise `false` plus whether
    /// the insert evicted the oldest entry.
    ///
    /// # Example
    ///
    /// ```
    /// use xlru::policy::lru::LruCache;
    ///
    /// let cache: LruCache<&str, u32> = LruCache::new(8, None).unwrap();
    /// assert_eq!(cache.contains_or_add("k", 1), (false, false));
    /// assert_eq!(cache.contains_or_add("k", 2), (true, false));
    /// assert_eq!(cache.peek(&"k").as_deref(), Some(&1));
    /// ```
    pub fn contains_or_add(&self, key: K, value: V) -> (bool, bool) {
        let mut inner = self.inner.write();
        if inner.contains(&key) {
            return (true, false);
        }
        let evicted = inner.add(key, Arc::new(value));
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_evicted(evicted);
        (false, evicted)
    }

    /// Removes a key, reporting whether it was present. Fires the eviction
    /// callback.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self.inner.write().remove(key).is_some();
        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
        removed
    }

    /// Removes and returns the least recently used entry. Fires the
    /// eviction callback.
    pub fn pop_oldest(&self) -> Option<(K, Arc<V>)> {
        self.inner.write().pop_oldest()
    }

    /// Inspects the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<(K, Arc<V>)> {
        self.inner
            .read()
            .peek_oldest()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Returns the keys ordered oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys()
    }

    /// Number of resident entries. Expired-but-unreclaimed entries count.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Removes every entry, firing the eviction callback for each.
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

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("LruCache")
            .field("len", &inner.len())
            .field("capacity", &inner.capacity())
            .finish()
    }
}
