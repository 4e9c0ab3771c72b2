//! Set-Associative Cache Tag Array.
//!
//! This module implements the (index × way) array of [`LineState`] with one
//! replacement-policy state per set. It owns address decomposition, warm-up
//! sampling and victim selection, and keeps the shared
//! [`CoherenceRegistry`](crate::coherence::CoherenceRegistry) informed of every
//! status it installs or evicts.
//!
//! A cache is single-threaded: every operation completes before returning and
//! nothing inside is locked. Only the registry may be shared across threads.

/// Address decomposition (classical and shifted).
pub mod addr;

/// Per-slot line state.
pub mod line;

/// Lookup, warm-up sampling, fills and eviction.
mod lookup;

/// Replacement policy implementations (LRU, PLRU, Random, RandomNotMRU, EV7).
pub mod policies;

/// Default seed counter.
pub mod seed;

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use self::addr::{AddressMap, Mapping};
pub use self::line::{AccessStats, LineState};
use self::policies::ReplacementPolicy;
use crate::coherence::{CacheManager, CoherenceRegistry};
use crate::common::{CLEARED_TAG, ConfigError, LineStatus};
use crate::config::CacheConfig;
use crate::events::CacheEventSink;

/// Set-associative tag array.
///
/// `R` is the coherence registry shared with sibling caches; `D` is the object
/// type stored when the cache is built with `with_data`.
pub struct Cache<R = CacheManager, D = u64> {
    ways: usize,
    lines_per_way: usize,
    objects_per_line: usize,
    map: AddressMap,
    /// Slot `(index, way)` lives at `index * ways + way`.
    lines: Vec<LineState>,
    /// Object `pos` of slot `s` lives at `s * objects_per_line + pos`. Empty without data.
    data: Vec<D>,
    policy: Box<dyn ReplacementPolicy>,
    registry: Arc<R>,
    level: String,
    owner: u32,
    warm_percent: u32,
    warmed_status: LineStatus,
    initial_status: LineStatus,
    seed: u64,
    rng: ChaCha8Rng,
    sink: Option<Arc<dyn CacheEventSink>>,
}

impl<R, D> fmt::Debug for Cache<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("level", &self.level)
            .field("owner", &self.owner)
            .field("ways", &self.ways)
            .field("lines_per_way", &self.lines_per_way)
            .field("objects_per_line", &self.objects_per_line)
            .field("policy", &self.policy.name())
            .field("warm_percent", &self.warm_percent)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl<R: CoherenceRegistry, D: Clone + Default> Cache<R, D> {
    /// Creates a cache and registers its level with `registry`.
    ///
    /// Every slot starts with the cleared-line tag, in `Warm` status when
    /// `warm_percent > 0` and `Invalid` otherwise.
    ///
    /// # Arguments
    ///
    /// * `config` - Geometry, policy, warm-up and registry identity.
    /// * `registry` - Registry shared with the sibling caches of this level.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`CacheConfig::validate`].
    pub fn new(config: &CacheConfig, registry: Arc<R>) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.random_seed.unwrap_or_else(seed::next_default_seed);
        let initial_status = config.initial_status();
        let slots = config.lines_per_way * config.ways;

        let lines = (0..slots)
            .map(|slot| {
                LineState::new(
                    (slot % config.ways) as u8,
                    config.objects_per_line,
                    CLEARED_TAG,
                    initial_status,
                )
            })
            .collect();
        let data = if config.with_data {
            vec![D::default(); slots * config.objects_per_line]
        } else {
            Vec::new()
        };

        registry.register(&config.level);
        tracing::debug!(
            level = %config.level,
            owner = config.owner,
            ways = config.ways,
            sets = config.lines_per_way,
            policy = ?config.policy,
            seed,
            "cache constructed"
        );

        Ok(Self {
            ways: config.ways,
            lines_per_way: config.lines_per_way,
            objects_per_line: config.objects_per_line,
            map: AddressMap::new(config.lines_per_way, config.objects_per_line),
            lines,
            data,
            policy: policies::build(config.policy, config.lines_per_way, config.ways, seed),
            registry,
            level: config.level.clone(),
            owner: config.owner,
            warm_percent: config.warm_percent,
            warmed_status: config.initial_warmed_state,
            initial_status,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            sink: None,
        })
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of sets.
    pub const fn lines_per_way(&self) -> usize {
        self.lines_per_way
    }

    /// Objects per line.
    pub const fn objects_per_line(&self) -> usize {
        self.objects_per_line
    }

    /// Registry level name.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Owner id reported to the registry.
    pub const fn owner(&self) -> u32 {
        self.owner
    }

    /// Seed of this instance's streams.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Shared registry.
    pub const fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Address map of this geometry.
    pub const fn address_map(&self) -> &AddressMap {
        &self.map
    }

    /// Attaches a sink that is told about fills and evictions.
    pub fn set_event_sink(&mut self, sink: Arc<dyn CacheEventSink>) {
        self.sink = Some(sink);
    }

    /// Classical set index of `addr`.
    #[inline]
    pub const fn index(&self, addr: u64) -> usize {
        self.map.classical_index(addr)
    }

    /// Classical tag of `addr`.
    #[inline]
    pub const fn tag(&self, addr: u64) -> u64 {
        self.map.classical_tag(addr)
    }

    /// Classical object position of `addr`.
    #[inline]
    pub const fn pos(&self, addr: u64) -> usize {
        self.map.classical_pos(addr)
    }

    /// Classical line address of `(index, tag)`.
    #[inline]
    pub fn original(&self, index: usize, tag: u64) -> u64 {
        self.map.classical_original(index, tag)
    }

    /// Shifted set index of `addr`.
    #[inline]
    pub const fn shifted_index(&self, addr: u64) -> usize {
        self.map.shifted_index(addr)
    }

    /// Shifted tag of `addr`.
    #[inline]
    pub const fn shifted_tag(&self, addr: u64) -> u64 {
        self.map.shifted_tag(addr)
    }

    /// Shifted object position of `addr`.
    #[inline]
    pub const fn shifted_pos(&self, addr: u64) -> usize {
        self.map.shifted_pos(addr)
    }

    /// Shifted line address of `(index, tag)`.
    #[inline]
    pub fn shifted_original(&self, index: usize, tag: u64) -> u64 {
        self.map.shifted_original(index, tag)
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.lines_per_way,
            "set index {index} out of range for {} sets",
            self.lines_per_way
        );
    }

    fn check_way(&self, way: usize) {
        assert!(way < self.ways, "way {way} out of range for a {}-way cache", self.ways);
    }

    #[inline]
    fn slot(&self, index: usize, way: usize) -> usize {
        self.check_index(index);
        self.check_way(way);
        index * self.ways + way
    }

    /// All ways of set `index`.
    pub fn set_lines(&self, index: usize) -> &[LineState] {
        self.check_index(index);
        let base = index * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Slot `(index, way)`, read-only.
    pub fn way_line_state(&self, index: usize, way: usize) -> &LineState {
        &self.lines[self.slot(index, way)]
    }

    /// Slot `(index, way)`.
    pub fn get_way_line_state(&mut self, index: usize, way: usize) -> &mut LineState {
        let slot = self.slot(index, way);
        &mut self.lines[slot]
    }

    /// Sets the status of slot `(index, way)` and reports it to the registry.
    ///
    /// A `Perfect` line keeps its status and nothing is reported.
    pub fn set_line_status(&mut self, index: usize, way: usize, status: LineStatus) {
        let slot = self.slot(index, way);
        let line = &mut self.lines[slot];
        if line.status() == LineStatus::Perfect {
            return;
        }
        line.set_status(status);
        let tag = line.tag();
        self.registry.set_status(&self.level, self.owner, index, tag, status);
    }

    /// Line the policy ranks last in set `index`.
    ///
    /// Random policies answer from a query stream of their own, so asking
    /// does not change later victims.
    pub fn get_lru_state(&mut self, index: usize) -> &mut LineState {
        self.check_index(index);
        let way = self.policy.lru_way(index);
        self.get_way_line_state(index, way)
    }

    /// Line most recently made MRU in set `index`.
    pub fn get_mru_state(&mut self, index: usize) -> &mut LineState {
        self.check_index(index);
        let way = self.policy.mru_way(index);
        self.get_way_line_state(index, way)
    }

    /// Marks `way` of set `index` most recently used.
    pub fn make_mru(&mut self, index: usize, way: usize) {
        self.check_index(index);
        self.check_way(way);
        self.policy.make_mru(index, way);
    }

    /// Marks `way` of set `index` least recently used.
    ///
    /// # Panics
    ///
    /// Panics unless the cache uses true LRU replacement.
    pub fn make_lru(&mut self, index: usize, way: usize) {
        self.check_index(index);
        self.check_way(way);
        self.policy.make_lru(index, way);
    }

    /// Name of the active replacement policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    fn data_slot(&self, index: usize, way: usize, pos: usize) -> usize {
        assert!(!self.data.is_empty(), "cache was built without line data");
        assert!(
            pos < self.objects_per_line,
            "object position {pos} out of range for a {}-object line",
            self.objects_per_line
        );
        self.slot(index, way) * self.objects_per_line + pos
    }

    /// Object `pos` of slot `(index, way)`.
    ///
    /// # Panics
    ///
    /// Panics if the cache was built without `with_data`.
    pub fn get_line_data(&self, index: usize, way: usize, pos: usize) -> &D {
        &self.data[self.data_slot(index, way, pos)]
    }

    /// Writes object `pos` of slot `(index, way)` and marks it dirty.
    ///
    /// # Panics
    ///
    /// Panics if the object is not valid or the cache has no line data.
    pub fn set_line_data(&mut self, index: usize, way: usize, pos: usize, value: D) {
        let at = self.data_slot(index, way, pos);
        let slot = self.slot(index, way);
        let line = &mut self.lines[slot];
        assert!(
            line.is_valid_object(pos),
            "object {pos} of set {index} way {way} is not valid; data cannot be written"
        );
        line.mark_dirty(pos);
        self.data[at] = value;
    }
}
