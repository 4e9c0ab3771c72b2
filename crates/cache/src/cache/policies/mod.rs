//! Cache Replacement Policies.
//!
//! Implements the algorithms that choose a victim way within a set.
//!
//! # Policies
//!
//! - `Lru`: True LRU, doubly linked MRU/LRU order per set.
//! - `Plru`: Tree pseudo-LRU over a packed bit-field.
//! - `Random`: Uniform random choice.
//! - `RandomNotMru`: Uniform random choice excluding the MRU way.
//! - `Ev7`: First way not touched since the last reset.
//!
//! Victim selection takes a reservation mask: bit `w` set means way `w` holds a
//! pending fill and must not be chosen. A mask covering every way is a caller
//! bug and panics.

/// EV7-style touched-bit replacement policy.
pub mod ev7;

/// True LRU replacement policy.
pub mod lru;

/// Tree pseudo-LRU replacement policy.
pub mod plru;

/// Fixed and derived PLRU mask/compare tables.
pub mod plru_tables;

/// Random and random-not-MRU replacement policies.
pub mod random;

pub use ev7::Ev7Policy;
pub use lru::LruPolicy;
pub use plru::PlruPolicy;
pub use plru_tables::PlruTable;
pub use random::{RandomNotMruPolicy, RandomPolicy};

use crate::config::ReplacementPolicy as PolicyKind;

/// One bit per way.
pub type WayMask = u64;

/// Mask with the low `ways` bits set.
#[inline]
pub const fn all_ways(ways: usize) -> WayMask {
    if ways >= 64 {
        WayMask::MAX
    } else {
        (1 << ways) - 1
    }
}

/// Panics when `reserved` leaves no way to pick.
#[inline]
pub fn assert_not_all_reserved(reserved: WayMask, ways: usize) {
    let all = all_ways(ways);
    assert!(reserved & all != all, "All ways cannot be reserved");
}

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim ways.
/// One instance covers every set of a cache; state is never shared between sets.
pub trait ReplacementPolicy: Send + Sync {
    /// Marks `way` of `set` as most recently used.
    fn make_mru(&mut self, set: usize, way: usize);

    /// Marks `way` of `set` as least recently used.
    ///
    /// Only true LRU keeps an order that can be rewound this way.
    fn make_lru(&mut self, set: usize, way: usize) {
        let _ = (set, way);
        panic!("{} replacement has no LRU position to move a way to", self.name());
    }

    /// Selects the way to evict from `set`, skipping ways set in `reserved`.
    ///
    /// # Panics
    ///
    /// Panics if `reserved` covers every way.
    fn get_victim(&mut self, set: usize, reserved: WayMask) -> usize;

    /// The way the policy currently ranks last in `set`.
    fn lru_way(&mut self, set: usize) -> usize;

    /// The way most recently passed to [`make_mru`](Self::make_mru) in `set`.
    fn mru_way(&self, set: usize) -> usize;

    /// Short policy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Builds the policy selected by `kind` for `sets` sets of `ways` ways.
///
/// `seed` feeds the private stream of the random policies.
pub fn build(kind: PolicyKind, sets: usize, ways: usize, seed: u64) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyKind::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyKind::Plru => Box::new(PlruPolicy::new(sets, ways)),
        PolicyKind::Random => Box::new(RandomPolicy::new(sets, ways, seed)),
        PolicyKind::RandomNotMru => Box::new(RandomNotMruPolicy::new(sets, ways, seed)),
        PolicyKind::Ev7 => Box::new(Ev7Policy::new(sets, ways)),
    }
}
