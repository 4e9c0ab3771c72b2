//! Configuration for a cache tag array.
//!
//! This module defines the construction parameters of a [`Cache`](crate::cache::Cache).
//! It provides:
//! 1. **Defaults:** Baseline geometry and warm-up settings.
//! 2. **Structures:** [`CacheConfig`], deserializable from JSON.
//! 3. **Enums:** The replacement policy selector.
//!
//! Geometry is validated by [`CacheConfig::validate`]; an unknown policy name
//! is rejected while parsing.

use serde::Deserialize;

use crate::common::{ConfigError, LineStatus, MAX_OBJECTS_PER_LINE, MAX_WAYS};

/// Default configuration constants.
mod defaults {
    use crate::common::LineStatus;

    /// Default associativity.
    pub const WAYS: usize = 4;

    /// Default number of sets.
    pub const LINES_PER_WAY: usize = 64;

    /// Default line width in objects (8 quadwords = 64 bytes).
    pub const OBJECTS_PER_LINE: usize = 8;

    /// Warm-up sampling is off unless requested.
    pub const WARM_PERCENT: u32 = 0;

    /// Status given to lines populated by warm-up sampling.
    pub const INITIAL_WARMED_STATE: LineStatus = LineStatus::Exclusive;

    /// Cache Manager level name.
    pub const LEVEL: &str = "L1";

    /// Owner id under which the cache registers its lines.
    pub const OWNER: u32 = 0;
}

/// Replacement policy algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// True LRU via a per-set doubly linked list.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Tree pseudo-LRU over a packed bit-field.
    #[serde(alias = "Plru")]
    Plru,
    /// Uniform random choice.
    #[serde(alias = "Random")]
    Random,
    /// Uniform random choice excluding the MRU way.
    #[serde(alias = "RandomNotMru", alias = "RandomNotMRU")]
    RandomNotMru,
    /// First way not touched since the last reset (EV7 style).
    #[serde(alias = "Ev7")]
    Ev7,
}

/// Construction parameters of one cache instance.
///
/// # Examples
///
/// ```
/// use waysim_core::config::{CacheConfig, ReplacementPolicy};
/// use waysim_core::common::LineStatus;
///
/// let json = r#"{
///     "ways": 8,
///     "lines_per_way": 100,
///     "objects_per_line": 4,
///     "warm_percent": 50,
///     "initial_warmed_state": "Shared",
///     "random_seed": 7,
///     "policy": "PLRU",
///     "level": "L2",
///     "owner": 1
/// }"#;
///
/// let config = CacheConfig::from_json(json).unwrap();
/// assert_eq!(config.ways, 8);
/// assert_eq!(config.policy, ReplacementPolicy::Plru);
/// assert_eq!(config.initial_warmed_state, LineStatus::Shared);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Associativity (1..=64).
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Number of sets. Need not be a power of two; masks round up.
    #[serde(default = "CacheConfig::default_lines_per_way")]
    pub lines_per_way: usize,

    /// Objects per line (power of two, 1..=64).
    #[serde(default = "CacheConfig::default_objects_per_line")]
    pub objects_per_line: usize,

    /// Probability, in percent, that a miss on a Warm slot is filled as a hit.
    #[serde(default)]
    pub warm_percent: u32,

    /// Status assigned to lines populated by warm-up sampling.
    #[serde(default = "CacheConfig::default_initial_warmed_state")]
    pub initial_warmed_state: LineStatus,

    /// Explicit PRNG seed. `None` draws from the process-wide seed counter.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Cache Manager level this instance belongs to.
    #[serde(default = "CacheConfig::default_level")]
    pub level: String,

    /// Owner id this instance reports to the Cache Manager.
    #[serde(default)]
    pub owner: u32,

    /// Allocate a parallel object array for line data.
    #[serde(default)]
    pub with_data: bool,
}

impl CacheConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or an unknown policy name.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks geometry and warm-up parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ways == 0 || self.ways > MAX_WAYS {
            return Err(ConfigError::InvalidWays(self.ways));
        }
        if self.lines_per_way == 0 {
            return Err(ConfigError::ZeroLines);
        }
        if !self.objects_per_line.is_power_of_two() || self.objects_per_line > MAX_OBJECTS_PER_LINE
        {
            return Err(ConfigError::InvalidObjectsPerLine(self.objects_per_line));
        }
        if self.warm_percent > 100 {
            return Err(ConfigError::InvalidWarmPercent(self.warm_percent));
        }
        if self.policy == ReplacementPolicy::RandomNotMru && self.ways < 2 {
            return Err(ConfigError::RandomNotMruNeedsTwoWays);
        }
        Ok(())
    }

    /// Status every slot starts in: `Warm` when sampling is enabled.
    pub const fn initial_status(&self) -> LineStatus {
        if self.warm_percent > 0 {
            LineStatus::Warm
        } else {
            LineStatus::Invalid
        }
    }

    fn default_ways() -> usize {
        defaults::WAYS
    }

    fn default_lines_per_way() -> usize {
        defaults::LINES_PER_WAY
    }

    fn default_objects_per_line() -> usize {
        defaults::OBJECTS_PER_LINE
    }

    const fn default_initial_warmed_state() -> LineStatus {
        defaults::INITIAL_WARMED_STATE
    }

    fn default_level() -> String {
        defaults::LEVEL.to_owned()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ways: defaults::WAYS,
            lines_per_way: defaults::LINES_PER_WAY,
            objects_per_line: defaults::OBJECTS_PER_LINE,
            warm_percent: defaults::WARM_PERCENT,
            initial_warmed_state: defaults::INITIAL_WARMED_STATE,
            random_seed: None,
            policy: ReplacementPolicy::default(),
            level: defaults::LEVEL.to_owned(),
            owner: defaults::OWNER,
            with_data: false,
        }
    }
}
