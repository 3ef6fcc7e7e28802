//! Replacement policies layered over the recency-list primitive.

pub mod arc;
pub mod lru;
pub mod two_q;

pub use arc::{ArcCache, ArcCore};
pub use lru::LruCache;
pub use two_q::{TwoQueueCache, TwoQueueCore, DEFAULT_GHOST_RATIO, DEFAULT_RECENT_RATIO};
