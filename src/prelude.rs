pub use crate::ds::{EvictCallback, RecencyList};
pub use crate::error::ConfigError;
pub use crate::expiry::Expiry;
pub use crate::policy::{ArcCache, LruCache, TwoQueueCache};

#[cfg(feature = "metrics")]
pub use crate::metrics::MetricsSnapshot;
