//! Per-entry lifetime sentinels.
//!
//! Every add-style operation takes an [`Expiry`] describing how long the
//! entry should live. Deadlines are absolute [`Instant`]s resolved at insert
//! time; `None` means the entry never expires. Expiration is lazy: an
//! expired entry keeps occupying its capacity slot until it is looked up
//! with `get`/`contains` or pushed out by capacity pressure.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use xlru::expiry::Expiry;
//! use xlru::policy::lru::LruCache;
//!
//! // Default TTL of five minutes, overridable per entry.
//! let cache: LruCache<String, u64> =
//!     LruCache::new(1024, Some(Duration::from_secs(300))).unwrap();
//!
//! cache.add_with_expire("session".into(), 1, Expiry::Default);
//! cache.add_with_expire("pinned".into(), 2, Expiry::Never);
//! cache.add_with_expire("probe".into(), 3, Expiry::After(Duration::from_secs(5)));
//! ```

use std::time::{Duration, Instant};

/// How long an entry should live, resolved to an absolute deadline at
/// insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires.
    Never,
    /// Use the cache's configured default TTL (which may itself be "never").
    Default,
    /// Expire `Duration` from now. A zero duration means no deadline, same
    /// as [`Expiry::Never`].
    After(Duration),
}

impl Expiry {
    /// Resolves this sentinel against a cache's default TTL.
    pub(crate) fn deadline(self, default_ttl: Option<Duration>) -> Option<Instant> {
        let ttl = match self {
            Expiry::Never => None,
            Expiry::Default => default_ttl,
            Expiry::After(d) => Some(d),
        };
        match ttl {
            Some(d) if !d.is_zero() => Some(Instant::now() + d),
            _ => None,
        }
    }
}

/// Returns `true` if `deadline` is set and already in the past.
pub(crate) fn is_expired(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(at) => Instant::now() > at,
        None => false,
    }
}
