//! Construction-time configuration errors.
//!
//! Only configuration problems are reported as values. Misuse of a constructed
//! cache (bad index, every way reserved, writing data into an invalid object)
//! is a caller bug and panics at the call site.

use thiserror::Error;

use super::constants::{MAX_OBJECTS_PER_LINE, MAX_WAYS};

/// Reasons a [`CacheConfig`](crate::config::CacheConfig) cannot build a cache.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Associativity outside `1..=MAX_WAYS`.
    #[error("way count must be between 1 and {max}, got {0}", max = MAX_WAYS)]
    InvalidWays(usize),

    /// A cache needs at least one set.
    #[error("lines per way must be greater than zero")]
    ZeroLines,

    /// Objects per line must be a power of two no larger than `MAX_OBJECTS_PER_LINE`.
    #[error(
        "objects per line must be a power of two between 1 and {max}, got {0}",
        max = MAX_OBJECTS_PER_LINE
    )]
    InvalidObjectsPerLine(usize),

    /// Warm-up percentage above 100.
    #[error("warm percent must be within 0..=100, got {0}")]
    InvalidWarmPercent(u32),

    /// Random-not-MRU has nothing to pick from with a single way.
    #[error("RandomNotMRU replacement requires more than one way")]
    RandomNotMruNeedsTwoWays,

    /// JSON configuration could not be parsed (includes unknown policy names).
    #[error("failed to parse cache configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
