//! Adaptive replacement cache (ARC).
//!
//! ARC keeps the 2Q idea of separating once-seen from repeatedly-seen
//! entries, but replaces the fixed recent-queue target with a self-tuning
//! one. Four [`RecencyList`]s and one integer:
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                        ArcCore<K, V>                          │
//!   │                                                               │
//!   │   t1   live, seen once recently          │  t1.len + t2.len   │
//!   │   t2   live, seen at least twice         │      <= size       │
//!   │   b1   ghost keys evicted from t1        │  b1.len <= size    │
//!   │   b2   ghost keys evicted from t2        │  b2.len <= size    │
//!   │                                                               │
//!   │   p: target size for t1, in [0, size], initially 0            │
//!   └───────────────────────────────────────────────────────────────┘
//!
//!   miss, ghost hit in b1 ──► grow p   (recency was undersized)
//!   miss, ghost hit in b2 ──► shrink p (frequency was undersized)
//! ```
//!
//! A hit in `b1` means a key evicted for lack of recency room came back,
//! so `p` grows and future evictions lean on `t2`; a hit in `b2` argues
//! the opposite. The `replace` selector evicts from `t1` while it is above
//! `p` (with the tie on a `b2` hit also sacrificing `t1`), recording the
//! victim's key in the matching ghost list.
//!
//! Promotions from `t1` to `t2` carry the entry's deadline along via
//! [`RecencyList::peek_with_deadline`] / `add_with_deadline`.
//!
//! [`ArcCore`] is the single-threaded policy; [`ArcCache`] wraps it in a
//! `parking_lot::RwLock` (write for `get`/`add`/`remove`/`purge`, read for
//! `peek`/`contains`/`len`/`keys`).
//!
//! Reference: Megiddo & Modha, "ARC: A Self-Tuning, Low Overhead
//! Replacement Cache", FAST 2003.

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

/// Single-threaded ARC policy core.
///
/// Exposes the same operations as [`ArcCache`] minus the lock, plus
/// white-box accessors ([`t1_len`](Self::t1_len), [`t2_len`](Self::t2_len),
/// [`b1_len`](Self::b1_len), [`b2_len`](Self::b2_len),
/// [`p_value`](Self::p_value)) for tests and diagnostics.
pub struct ArcCore<K, V> {
    size: usize,
    /// Adaptive target size for `t1`.
    p: usize,

    t1: RecencyList<K, V>,
    t2: RecencyList<K, V>,
    b1: RecencyList<K, ()>,
    b2: RecencyList<K, ()>,
}

impl<K, V> ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an ARC core. Fails with [`ConfigError::InvalidSize`] when
    /// `size` is zero.
    pub fn new(size: usize, default_ttl: Option<Duration>) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::InvalidSize);
        }
        Ok(Self {
            size,
            p: 0,
            t1: RecencyList::new(size, None, default_ttl)?,
            t2: RecencyList::new(size, None, default_ttl)?,
            b1: RecencyList::new(size, None, None)?,
            b2: RecencyList::new(size, None, None)?,
        })
    }

    /// Looks up a key. A hit in `t1` promotes the entry to `t2`, carrying
    /// its deadline along; a hit in `t2` refreshes its position there.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.t2.get(key) {
            return Some(value.clone());
        }

        if let Some((value, deadline)) = self
            .t1
            .peek_with_deadline(key)
            .map(|(v, d)| (v.clone(), d))
        {
            self.t1.remove(key);
            self.t2.add_with_deadline(key.clone(), value.clone(), deadline);
            return Some(value);
        }

        None
    }

    /// Adds a never-expiring entry.
    pub fn add(&mut self, key: K, value: V) {
        self.add_with_expire(key, value, Expiry::Never);
    }

    /// Adds an entry with the given lifetime, running the ARC admission
    /// rules: live hits update/promote, ghost hits adapt `p` and land in
    /// `t2`, fresh keys land in `t1` after making room and trimming the
    /// ghost lists to their targets.
    pub fn add_with_expire(&mut self, key: K, value: V, expiry: Expiry) {
        // Seen at least twice: update in place.
        if self.t2.contains(&key) {
            self.t2.add_with_expire(key, value, expiry);
            return;
        }

        // Seen once recently: this touch proves reuse.
        if self.t1.contains(&key) {
            self.t1.remove(&key);
            self.t2.add_with_expire(key, value, expiry);
            return;
        }

        // Ghost hit in b1: the recency side was undersized.
        if self.b1.contains(&key) {
            let delta = std::cmp::max(1, self.b2.len() / self.b1.len());
            self.p = std::cmp::min(self.size, self.p + delta);

            if self.t1.len() + self.t2.len() >= self.size {
                self.replace(false);
            }

            self.b1.remove(&key);
            self.t2.add_with_expire(key, value, expiry);
            return;
        }

        // Ghost hit in b2: the frequency side was undersized.
        if self.b2.contains(&key) {
            let delta = std::cmp::max(1, self.b1.len() / self.b2.len());
            self.p = self.p.saturating_sub(delta);

            if self.t1.len() + self.t2.len() >= self.size {
                self.replace(true);
            }

            self.b2.remove(&key);
            self.t2.add_with_expire(key, value, expiry);
            return;
        }

        // Fresh key.
        if self.t1.len() + self.t2.len() >= self.size {
            self.replace(false);
        }

        // p may have drifted since the ghosts were recorded; trim each
        // ghost list to its current target before admitting the entry.
        if self.b1.len() > self.size - self.p {
            self.b1.pop_oldest();
        }
        if self.b2.len() > self.p {
            self.b2.pop_oldest();
        }

        self.t1.add_with_expire(key, value, expiry);
    }

    /// Evicts one live entry, recording its key in the matching ghost
    /// list. `t1` gives up its oldest while above target; the tie at
    /// exactly `p` goes against `t1` only on a `b2` ghost hit.
    fn replace(&mut self, in_b2: bool) {
        let t1_len = self.t1.len();
        if t1_len > 0 && (t1_len > self.p || (t1_len == self.p && in_b2)) {
            if let Some((key, _)) = self.t1.pop_oldest() {
                self.b1.add(key, ());
            }
        } else if let Some((key, _)) = self.t2.pop_oldest() {
            self.b2.add(key, ());
        }
    }

    /// Removes a key from whichever list holds it, ghosts included.
    pub fn remove(&mut self, key: &K) {
        if self.t1.remove(key).is_some() {
            return;
        }
        if self.t2.remove(key).is_some() {
            return;
        }
        if self.b1.remove(key).is_some() {
            return;
        }
        self.b2.remove(key);
    }

    /// Returns `true` if the key is live (ghosts do not count).
    pub fn contains(&self, key: &K) -> bool {
        self.t1.contains(key) || self.t2.contains(key)
    }

    /// Looks up a key without promoting or reordering.
    pub fn peek(&self, key: &K) -> Option<V> {
        if let Some(value) = self.t1.peek(key) {
            return Some(value.clone());
        }
        self.t2.peek(key).cloned()
    }

    /// Live keys: `t2`'s oldest to newest, then `t1`'s.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = self.t2.keys();
        keys.extend(self.t1.keys());
        keys
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    /// Returns `true` if no live entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Entries seen exactly once recently.
    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Entries seen at least twice.
    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Ghost keys recently evicted from `t1`.
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Ghost keys recently evicted from `t2`.
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Current adaptive target for `t1`.
    pub fn p_value(&self) -> usize {
        self.p
    }

    /// Empties all four lists and resets the adaptive target.
    pub fn purge(&mut self) {
        self.t1.purge();
        self.t2.purge();
        self.b1.purge();
        self.b2.purge();
        self.p = 0;
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.t1.debug_validate_invariants();
        self.t2.debug_validate_invariants();
        self.b1.debug_validate_invariants();
        self.b2.debug_validate_invariants();

        assert!(self.t1.len() + self.t2.len() <= self.size);
        assert!(self.b1.len() <= self.size);
        assert!(self.b2.len() <= self.size);
        assert!(self.p <= self.size);

        // Pairwise disjointness of live and ghost membership. Holds for
        // every reachable state without expired stragglers.
        let t2: std::collections::HashSet<_> = self.t2.keys().into_iter().collect();
        let b1: std::collections::HashSet<_> = self.b1.keys().into_iter().collect();
        let b2: std::collections::HashSet<_> = self.b2.keys().into_iter().collect();
        for key in self.t1.keys() {
            assert!(!t2.contains(&key), "key live in both t1 and t2");
            assert!(!b1.contains(&key) && !b2.contains(&key), "live key has a ghost");
        }
        for key in &t2 {
            assert!(!b1.contains(key) && !b2.contains(key), "live key has a ghost");
        }
        for key in &b1 {
            assert!(!b2.contains(key), "key ghosted in both b1 and b2");
        }
    }
}

impl<K, V> fmt::Debug for ArcCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArcCore")
            .field("size", &self.size)
            .field("p", &self.p)
            .field("t1_len", &self.t1.len())
            .field("t2_len", &self.t2.len())
            .field("b1_len", &self.b1.len())
            .field("b2_len", &self.b2.len())
            .finish()
    }
}

/// Fixed-size, thread-safe ARC cache.
///
/// # Example
///
/// ```
/// use xlru::policy::arc::ArcCache;
///
/// let cache: ArcCache<String, u32> = ArcCache::new(128, None).unwrap();
/// cache.add("a".into(), 1);
///
/// // The first get promotes "a" into the frequency-tracked list.
/// assert_eq!(cache.get(&"a".into()).as_deref(), Some(&1));
/// assert_eq!(cache.len(), 1);
/// ```
pub struct ArcCache<K, V> {
    inner: RwLock<ArcCore<K, Arc<V>>>,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an ARC cache holding at most `size` live entries, with
    /// `default_ttl` applied to entries added via [`Expiry::Default`].
    pub fn new(size: usize, default_ttl: Option<Duration>) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: RwLock::new(ArcCore::new(size, default_ttl)?),
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::default(),
        })
    }

    /// Looks up a key, promoting a once-seen entry into `t2`.
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

    /// Live keys: `t2` oldest to newest, then `t1`.
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

    /// Empties the cache, ghosts included, and resets the adaptive target.
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

impl<K, V> fmt::Debug for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ArcCache")
            .field("len", &inner.len())
            .field("capacity", &inner.capacity())
            .finish()
    }
}
