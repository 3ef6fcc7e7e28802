//! Error types for the xlru library.
//!
//! The error surface is deliberately small: every runtime operation on a
//! cache is total, so the only thing that can fail is construction with
//! invalid parameters. Each variant names the parameter that failed so
//! callers can tell them apart.
//!
//! ## Example Usage
//!
//! ```
//! use xlru::error::ConfigError;
//! use xlru::policy::two_q::TwoQueueCache;
//!
//! let bad = TwoQueueCache::<String, i32>::with_params(100, 2.0, 0.5, None);
//! assert_eq!(bad.unwrap_err(), ConfigError::InvalidRecentRatio);
//! ```

use std::fmt;

/// Error returned when cache construction parameters are invalid.
///
/// Produced by the fallible constructors on every policy
/// (e.g. [`LruCache::new`](crate::policy::lru::LruCache::new),
/// [`TwoQueueCache::with_params`](crate::policy::two_q::TwoQueueCache::with_params)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity was zero.
    InvalidSize,
    /// 2Q recent ratio outside `[0.0, 1.0]`.
    InvalidRecentRatio,
    /// 2Q ghost ratio outside `[0.0, 1.0]`.
    InvalidGhostRatio,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSize => f.write_str("cache size must be positive"),
            ConfigError::InvalidRecentRatio => {
                f.write_str("recent ratio must be within [0.0, 1.0]")
            },
            ConfigError::InvalidGhostRatio => f.write_str("ghost ratio must be within [0.0, 1.0]"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        assert_eq!(
            ConfigError::InvalidSize.to_string(),
            "cache size must be positive"
        );
        assert!(
            ConfigError::InvalidRecentRatio
                .to_string()
                .contains("recent ratio")
        );
        assert!(
            ConfigError::InvalidGhostRatio
                .to_string()
                .contains("ghost ratio")
        );
    }

    #[test]
    fn variants_are_distinguishable() {
        assert_ne!(
            ConfigError::InvalidRecentRatio,
            ConfigError::InvalidGhostRatio
        );
        assert_eq!(ConfigError::InvalidSize, ConfigError::InvalidSize);
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
