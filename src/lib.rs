//! xlru: bounded in-process caches over a shared recency-list substrate.
//!
//! One primitive, three policies:
//!
//! - [`RecencyList`](ds::RecencyList) — bounded ordered map with O(1)
//!   touch, O(1) pop-oldest, lazy per-entry expiration and an optional
//!   eviction callback.
//! - [`LruCache`](policy::lru::LruCache) — classical LRU: one recency list
//!   behind a reader-writer lock.
//! - [`TwoQueueCache`](policy::two_q::TwoQueueCache) — 2Q: one-hit entries
//!   kept apart from promoted frequent entries, with a ghost list of
//!   recently evicted keys.
//! - [`ArcCache`](policy::arc::ArcCache) — adaptive replacement cache:
//!   self-tunes the recency/frequency split from ghost-list hits.
//!
//! Entries may carry a lifetime ([`Expiry`](expiry::Expiry)); expiration is
//! lazy, checked on access rather than swept in the background. See each
//! policy module for the exact admission and eviction rules.

pub mod ds;
pub mod error;
pub mod expiry;
pub mod policy;
pub mod prelude;

#[cfg(feature = "metrics")]
pub mod metrics;
