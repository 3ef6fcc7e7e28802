//! Bounded recency list with lazy per-entry expiration.
//!
//! The substrate every policy in this crate is built from: an ordered
//! mapping from key to value where the order is exactly the touch history,
//! newest at the front. Nodes live in a [`SlotArena`] and are linked by
//! `SlotId`, with an `FxHashMap` index for O(1) lookup.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────┐   ┌─────────────────────────────────┐
//!   │  index: FxHashMap<K,SlotId> │   │  arena: SlotArena<Node<K, V>>   │
//!   │                             │   │                                 │
//!   │  ┌───────────┬──────────┐   │   │  head ──► [A] ◄──► [B] ◄──► [C] │
//!   │  │    Key    │  SlotId  │   │   │           MRU               LRU │
//!   │  ├───────────┼──────────┤   │   │                          ▲      │
//!   │  │  "key_a"  │   id_0   │───┼───┼─────────► [A]            │      │
//!   │  │  "key_b"  │   id_1   │───┼───┼─────────► [B]            │      │
//!   │  │  "key_c"  │   id_2   │───┼───┼─────────► [C] ◄── tail ──┘      │
//!   │  └───────────┴──────────┘   │   │                                 │
//!   └─────────────────────────────┘   └─────────────────────────────────┘
//! ```
//!
//! Each node carries an optional absolute deadline. Expiration is lazy:
//! `get` and `contains` report an expired entry as a miss but leave it in
//! place, where it keeps occupying a capacity slot until it is removed
//! explicitly or pushed out the back by an insert. There is no background
//! reaper.
//!
//! ## Operations
//!
//! | Operation             | Reorders | Honors expiry | Complexity |
//! |-----------------------|----------|---------------|------------|
//! | `add*`                | front    | n/a           | O(1) avg   |
//! | `get`                 | front    | yes (miss)    | O(1) avg   |
//! | `peek`                | no       | no            | O(1) avg   |
//! | `peek_with_deadline`  | no       | no            | O(1) avg   |
//! | `contains`            | no       | yes           | O(1) avg   |
//! | `remove` / `pop_oldest` | n/a    | no            | O(1) avg   |
//! | `keys`                | no       | no            | O(n)       |
//! | `purge`               | n/a      | no            | O(n)       |
//!
//! The low-level trio `add_with_deadline` / `peek_with_deadline` /
//! `pop_oldest` exists so the composite policies (2Q, ARC) can move entries
//! between lists without losing their deadlines.
//!
//! The eviction callback fires on capacity eviction, `remove`, `pop_oldest`
//! and `purge`, while the evicted key is still observable. It never fires
//! for an expired entry reported as a `get`/`contains` miss.

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::ConfigError;
use crate::expiry::{is_expired, Expiry};

/// Callback invoked with `(key, value)` whenever an entry leaves the list
/// by eviction, removal or purge.
///
/// Runs synchronously inside the mutating operation. When the list sits
/// behind a policy lock the callback runs inside the critical section, so
/// it must not call back into the same cache. The `Send + Sync` bound is
/// what lets a policy holding the list be shared across threads; capture
/// atomics or channels rather than `Rc`/`RefCell` state.
pub type EvictCallback<K, V> = Box<dyn FnMut(&K, &V) + Send + Sync>;

struct Node<K, V> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    key: K,
    value: V,
    deadline: Option<Instant>,
}

/// Bounded mapping from key to value, ordered newest-touched to
/// oldest-touched, with lazy expiration and an optional eviction callback.
pub struct RecencyList<K, V> {
    arena: SlotArena<Node<K, V>>,
    index: FxHashMap<K, SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    capacity: usize,
    on_evict: Option<EvictCallback<K, V>>,
    default_ttl: Option<Duration>,
}

impl<K, V> RecencyList<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a list holding at most `capacity` entries.
    ///
    /// `default_ttl` is applied to entries added with [`Expiry::Default`];
    /// `None` means such entries never expire. Fails with
    /// [`ConfigError::InvalidSize`] when `capacity` is zero.
    pub fn new(
        capacity: usize,
        on_evict: Option<EvictCallback<K, V>>,
        default_ttl: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidSize);
        }
        Ok(Self {
            arena: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
            capacity,
            on_evict,
            default_ttl,
        })
    }

    /// Adds a never-expiring entry. Returns `true` if the insert pushed the
    /// oldest entry out.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.add_with_expire(key, value, Expiry::Never)
    }

    /// Adds an entry whose lifetime is described by `expiry`, resolving the
    /// absolute deadline now. Returns `true` if an eviction occurred.
    pub fn add_with_expire(&mut self, key: K, value: V, expiry: Expiry) -> bool {
        let deadline = expiry.deadline(self.default_ttl);
        self.add_with_deadline(key, value, deadline)
    }

    /// Adds an entry with a pre-resolved absolute deadline.
    ///
    /// If the key is already present the value is replaced and the entry
    /// moves to the front, but the stored deadline is retained; `deadline`
    /// is ignored on that path. Callers that need to re-arm an entry's
    /// deadline must `remove` it first. Returns `true` if inserting a new
    /// entry evicted the oldest one.
    pub fn add_with_deadline(&mut self, key: K, value: V, deadline: Option<Instant>) -> bool {
        if let Some(&id) = self.index.get(&key) {
            self.detach(id);
            self.attach_front(id);
            if let Some(node) = self.arena.get_mut(id) {
                node.value = value;
            }
            return false;
        }

        let id = self.arena.insert(Node {
            prev: None,
            next: None,
            key: key.clone(),
            value,
            deadline,
        });
        self.attach_front(id);
        self.index.insert(key, id);

        if self.index.len() > self.capacity {
            self.evict_oldest();
            return true;
        }
        false
    }

    /// Looks up a key and marks it most recently used.
    ///
    /// An expired entry is reported as a miss but is neither removed nor
    /// reordered.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        let deadline = self.arena.get(id)?.deadline;
        if is_expired(deadline) {
            return None;
        }
        self.detach(id);
        self.attach_front(id);
        self.arena.get(id).map(|node| &node.value)
    }

    /// Looks up a key without touching recency. Ignores expiration: a
    /// stale-but-resident entry is still returned.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.arena.get(id).map(|node| &node.value)
    }

    /// Like [`peek`](Self::peek), but also returns the stored deadline so
    /// an entry can be re-inserted elsewhere without losing it.
    pub fn peek_with_deadline(&self, key: &K) -> Option<(&V, Option<Instant>)> {
        let id = *self.index.get(key)?;
        self.arena.get(id).map(|node| (&node.value, node.deadline))
    }

    /// Returns `true` if the key is present and not expired. Does not touch
    /// recency.
    pub fn contains(&self, key: &K) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        match self.arena.get(id) {
            Some(node) => !is_expired(node.deadline),
            None => false,
        }
    }

    /// Removes a key, firing the eviction callback if the key was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = *self.index.get(key)?;
        self.remove_id(id).map(|(_, value)| value)
    }

    /// Removes and returns the oldest entry, firing the eviction callback.
    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        let id = self.tail?;
        self.remove_id(id)
    }

    /// Inspects the oldest entry without removing it.
    pub fn peek_oldest(&self) -> Option<(&K, &V)> {
        let id = self.tail?;
        self.arena.get(id).map(|node| (&node.key, &node.value))
    }

    /// Returns the keys ordered oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.index.len());
        let mut current = self.tail;
        while let Some(id) = current {
            let Some(node) = self.arena.get(id) else { break };
            keys.push(node.key.clone());
            current = node.prev;
        }
        keys
    }

    /// Number of resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every entry, firing the eviction callback for each.
    pub fn purge(&mut self) {
        while self.pop_oldest().is_some() {}
    }

    fn evict_oldest(&mut self) {
        if let Some(id) = self.tail {
            self.remove_id(id);
        }
    }

    /// Unlinks the node, drops it from arena and index, and fires the
    /// callback while the entry is still whole.
    fn remove_id(&mut self, id: SlotId) -> Option<(K, V)> {
        self.detach(id);
        let node = self.arena.remove(id)?;
        self.index.remove(&node.key);
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.arena.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.arena.get_mut(prev_id) {
                    prev_node.next = next;
                }
            },
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = self.arena.get_mut(next_id) {
                    next_node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head_id) => {
                if let Some(head_node) = self.arena.get_mut(head_id) {
                    head_node.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.arena.debug_validate_invariants();
        assert_eq!(self.index.len(), self.arena.len());
        assert!(self.index.len() <= self.capacity);

        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len(), 0);
            return;
        }

        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self.arena.get(id).expect("linked node missing from arena");
            assert_eq!(node.prev, prev);
            assert_eq!(self.index.get(&node.key), Some(&id));
            if node.next.is_none() {
                assert_eq!(self.tail, Some(id));
            }
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len());
        }
        assert_eq!(count, self.len());
    }
}

impl<K, V> fmt::Debug for RecencyList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyList")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("has_on_evict", &self.on_evict.is_some())
            .finish()
    }
}
