//! Cache Container Tests.
//!
//! Construction, lookup, fills, victim selection, MRU/LRU bookkeeping, line
//! data and clearing on a single tag array.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use waysim_core::cache::Cache;
use waysim_core::coherence::{CoherenceRegistry, SyncCacheManager};
use waysim_core::common::{CLEARED_TAG, ConfigError, LineStatus};
use waysim_core::config::{CacheConfig, ReplacementPolicy};

use crate::common::harness::{cache, config, policy_config, small_config};

const T1: u64 = 0x10000;
const T2: u64 = 0x20000;
const T3: u64 = 0x30000;
const T4: u64 = 0x40000;
const T5: u64 = 0x50000;

fn fill(cache: &mut Cache, index: usize, tag: u64) -> usize {
    cache.warm_up_fill(index, tag, None, LineStatus::Exclusive, 0)
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn new_cache_is_empty() {
    let cache = cache(&small_config());
    assert_eq!(cache.ways(), 4);
    assert_eq!(cache.lines_per_way(), 16);
    assert_eq!(cache.objects_per_line(), 8);
    assert_eq!(cache.policy_name(), "LRU");
    assert_eq!(cache.seed(), 0xC0FFEE);

    for index in 0..16 {
        for (way, line) in cache.set_lines(index).iter().enumerate() {
            assert_eq!(line.way(), way);
            assert_eq!(line.tag(), CLEARED_TAG);
            assert_eq!(line.status(), LineStatus::Invalid);
            assert!(!line.is_owned());
        }
    }
    assert_eq!(cache.registry().level_names(), vec!["L1".to_owned()]);
}

#[rstest]
#[case(ReplacementPolicy::Lru, "LRU")]
#[case(ReplacementPolicy::Plru, "PLRU")]
#[case(ReplacementPolicy::Random, "Random")]
#[case(ReplacementPolicy::RandomNotMru, "RandomNotMRU")]
#[case(ReplacementPolicy::Ev7, "EV7")]
fn policy_selection(#[case] policy: ReplacementPolicy, #[case] name: &str) {
    assert_eq!(cache(&policy_config(policy)).policy_name(), name);
}

#[test]
fn invalid_geometry_is_rejected() {
    let registry = Arc::new(SyncCacheManager::new());
    let bad = CacheConfig {
        ways: 0,
        ..small_config()
    };
    let err = Cache::<_, u64>::new(&bad, Arc::clone(&registry)).map(|_| ());
    assert!(matches!(err, Err(ConfigError::InvalidWays(0))));

    let bad = CacheConfig {
        objects_per_line: 6,
        ..small_config()
    };
    let err = Cache::<_, u64>::new(&bad, registry).map(|_| ());
    assert!(matches!(err, Err(ConfigError::InvalidObjectsPerLine(6))));
}

/// Set counts that are not a power of two still index every set.
#[test]
fn odd_set_count() {
    let mut cache = cache(&config(2, 12, 4));
    let way = fill(&mut cache, 11, T1);
    assert_eq!(cache.way_line_state(11, way).tag(), T1);
}

#[test]
fn address_helpers_delegate_to_the_map() {
    let cache = cache(&small_config());
    let addr = 0x12345;
    assert_eq!(cache.index(addr), 13);
    assert_eq!(cache.tag(addr), 0x12000);
    assert_eq!(cache.pos(addr), 0);
    assert_eq!(cache.original(13, 0x12000), 0x12340);
    let map = cache.address_map();
    assert_eq!(cache.shifted_index(addr), map.shifted_index(addr));
    assert_eq!(cache.shifted_tag(addr), map.shifted_tag(addr));
    assert_eq!(cache.shifted_pos(addr), map.shifted_pos(addr));
}

// ══════════════════════════════════════════════════════════
// 2. Lookup and Fill
// ══════════════════════════════════════════════════════════

/// 4 ways, 16 sets, 8 objects: address 0x10000 maps to set 0, position 0.
#[test]
fn worked_example() {
    let mut cache = cache(&small_config());
    let addr = 0x10000;
    let (index, tag) = (cache.index(addr), cache.tag(addr));
    assert_eq!((cache.pos(addr), index, tag), (0, 0, 0x10000));

    assert!(cache.get_line_state(index, tag).is_none());
    let _ = cache.warm_up_fill(index, tag, None, LineStatus::Shared, 7);

    let line = cache.get_line_state(index, tag).cloned();
    let Some(line) = line else {
        panic!("filled line not found");
    };
    assert_eq!(line.status(), LineStatus::Shared);
    assert_eq!(line.owner(), 7);
    assert!((0..8).all(|pos| line.is_valid_object(pos)));
}

#[test]
fn miss_then_fill_then_hit() {
    let mut cache = cache(&small_config());
    assert!(cache.get_line_state(3, T1).is_none());

    let way = cache.warm_up_fill(3, T1, None, LineStatus::Modified, 7);
    assert_eq!(way, 0);

    let line = cache.get_line_state(3, T1).cloned();
    let Some(line) = line else {
        panic!("filled line not found");
    };
    assert_eq!(line.way(), 0);
    assert_eq!(line.status(), LineStatus::Modified);
    assert_eq!(line.owner(), 7);
    assert!(line.all_valid());
    assert!(line.any_dirty());

    let registry = cache.registry();
    assert_eq!(registry.status("L1", 3, T1), LineStatus::Exclusive);
    assert_eq!(registry.owner_status("L1", 0, 3, T1), LineStatus::Modified);
}

#[test]
fn hit_allows_in_place_updates() {
    let mut cache = cache(&small_config());
    let _ = fill(&mut cache, 0, T1);
    if let Some(line) = cache.get_line_state(0, T1) {
        line.clean_object(0);
        line.record_access(40);
    }
    let line = cache.way_line_state(0, 0);
    assert!(!line.is_dirty_object(0));
    assert_eq!(line.stats().accesses, 1);
}

/// A tag that is present is not filled twice.
#[test]
fn refill_returns_existing_way() {
    let mut cache = cache(&small_config());
    assert_eq!(fill(&mut cache, 0, T1), 0);
    assert_eq!(fill(&mut cache, 0, T2), 1);
    assert_eq!(fill(&mut cache, 0, T1), 0);
}

/// Invalid ways are used first, then the LRU way is evicted.
#[test]
fn fill_uses_invalid_ways_then_evicts_lru() {
    let mut cache = cache(&small_config());
    let ways = [T1, T2, T3, T4].map(|tag| fill(&mut cache, 5, tag));
    assert_eq!(ways, [0, 1, 2, 3]);

    assert_eq!(fill(&mut cache, 5, T5), 0);
    assert!(cache.get_line_state(5, T1).is_none());
    assert_eq!(cache.get_mru_state(5).tag(), T5);
    assert_eq!(cache.get_lru_state(5).tag(), T2);

    let registry = cache.registry();
    assert_eq!(registry.owner_status("L1", 0, 5, T1), LineStatus::Invalid);
    assert_eq!(registry.owner_status("L1", 0, 5, T5), LineStatus::Exclusive);
}

#[test]
fn fill_honors_requested_way() {
    let mut cache = cache(&small_config());
    assert_eq!(cache.warm_up_fill(2, T1, Some(3), LineStatus::Shared, 0), 3);
    assert_eq!(cache.way_line_state(2, 3).tag(), T1);
    assert_eq!(cache.get_mru_state(2).way(), 3);
}

/// A reservation on the tag is a hit; reserved ways are never victims.
#[test]
fn reserved_lines() {
    let mut cache = cache(&small_config());
    {
        let line = cache.get_way_line_state(1, 2);
        line.set_tag(T1);
        line.set_status(LineStatus::Reserved);
    }
    assert_eq!(cache.get_line_state(1, T1).map(|l| l.way()), Some(2));

    // LRU order of a fresh set is 0..3; ways 3 and 2 are both reserved now.
    cache.set_line_status(1, 3, LineStatus::Reserved);
    assert_eq!(cache.victim_way(1, false), 1);
    cache.set_line_status(1, 2, LineStatus::Exclusive);
    assert_eq!(cache.victim_way(1, false), 2);
}

/// Two reservations for one tag are not a hit; the lookup carries on as a miss.
#[test]
fn ambiguous_reservations_miss() {
    let mut cache = cache(&small_config());
    for way in [1, 2] {
        let line = cache.get_way_line_state(0, way);
        line.set_tag(T1);
        line.set_status(LineStatus::Reserved);
    }
    assert!(cache.get_line_state(0, T1).is_none());
    assert!(cache.get_line_state_with(0, T1, 0, true).is_none());

    // A live copy still wins over both reservations.
    {
        let line = cache.get_way_line_state(0, 3);
        line.set_tag(T1);
        line.set_status(LineStatus::Shared);
    }
    assert_eq!(cache.get_line_state(0, T1).map(|l| l.way()), Some(3));
}

/// A fill never evicts a `Perfect` line.
#[test]
fn perfect_lines_are_never_victims() {
    let mut cache = cache(&small_config());
    for tag in [T1, T2, T3] {
        let _ = cache.warm_up_fill(0, tag, None, LineStatus::Perfect, 0);
    }
    assert_eq!(fill(&mut cache, 0, T4), 3);
    // Way 0 is LRU but Perfect.
    assert_eq!(cache.victim_way(0, false), 3);

    assert_eq!(fill(&mut cache, 0, T5), 3);
    for (way, tag) in [(0, T1), (1, T2), (2, T3)] {
        let line = cache.way_line_state(0, way);
        assert_eq!((line.tag(), line.status()), (tag, LineStatus::Perfect));
    }
    assert_eq!(cache.way_line_state(0, 3).tag(), T5);
    assert_eq!(cache.registry().owner_status("L1", 0, 0, T1), LineStatus::Perfect);
    assert_eq!(cache.registry().owner_status("L1", 0, 0, T4), LineStatus::Invalid);
    assert!(cache.get_line_state(0, T1).is_some());
}

#[test]
fn victim_prefers_invalid_ways_on_request() {
    let mut cache = cache(&small_config());
    let _ = fill(&mut cache, 0, T1);
    let _ = fill(&mut cache, 0, T2);
    assert_eq!(cache.get_victim_state(0, true).way(), 2);
    // Without the preference the policy decides: way 3 is LRU.
    assert_eq!(cache.get_victim_state(0, false).way(), 3);
}

#[test]
#[should_panic(expected = "both hold tag")]
fn duplicate_live_tags_panic() {
    let mut cache = cache(&small_config());
    for way in [0, 2] {
        let line = cache.get_way_line_state(4, way);
        line.set_tag(T1);
        line.set_status(LineStatus::Shared);
    }
    let _ = cache.get_line_state(4, T1);
}

#[test]
#[should_panic(expected = "out of range")]
fn index_out_of_range_panics() {
    let mut cache = cache(&small_config());
    let _ = cache.get_line_state(16, T1);
}

#[test]
#[should_panic(expected = "out of range")]
fn way_out_of_range_panics() {
    let cache = cache(&small_config());
    let _ = cache.way_line_state(0, 4);
}

#[test]
#[should_panic(expected = "All ways cannot be reserved")]
fn all_reserved_victim_panics() {
    let mut cache = cache(&small_config());
    for way in 0..4 {
        cache.set_line_status(0, way, LineStatus::Reserved);
    }
    let _ = cache.victim_way(0, false);
}

// ══════════════════════════════════════════════════════════
// 3. Status and Replacement Bookkeeping
// ══════════════════════════════════════════════════════════

#[test]
fn perfect_lines_ignore_status_changes() {
    let mut cache = cache(&small_config());
    let _ = fill(&mut cache, 0, T1);
    cache.set_line_status(0, 0, LineStatus::Perfect);
    cache.set_line_status(0, 0, LineStatus::Invalid);
    assert_eq!(cache.way_line_state(0, 0).status(), LineStatus::Perfect);
    assert_eq!(
        cache.registry().owner_status("L1", 0, 0, T1),
        LineStatus::Perfect
    );
}

#[test]
fn make_mru_and_make_lru() {
    let mut cache = cache(&small_config());
    cache.make_mru(6, 2);
    assert_eq!(cache.get_mru_state(6).way(), 2);
    cache.make_lru(6, 2);
    assert_eq!(cache.get_lru_state(6).way(), 2);
    assert_eq!(cache.get_mru_state(6).way(), 0);
}

#[test]
#[should_panic(expected = "out of range")]
fn make_mru_checks_bounds() {
    let mut cache = cache(&small_config());
    cache.make_mru(0, 4);
}

/// Asking a random cache for its LRU line leaves the victim sequence alone.
#[test]
fn lru_queries_do_not_disturb_random_victims() {
    let config = policy_config(ReplacementPolicy::Random);
    let mut quiet = cache(&config);
    let mut asked = cache(&config);
    for _ in 0..32 {
        let _ = asked.get_lru_state(1);
        assert_eq!(asked.victim_way(1, false), quiet.victim_way(1, false));
    }
}

#[test]
#[should_panic(expected = "no LRU position")]
fn make_lru_requires_true_lru() {
    let mut cache = cache(&policy_config(ReplacementPolicy::Plru));
    cache.make_lru(0, 1);
}

// ══════════════════════════════════════════════════════════
// 4. Line Data
// ══════════════════════════════════════════════════════════

#[test]
fn line_data_round_trip() {
    let mut cache: Cache = cache(&CacheConfig {
        with_data: true,
        ..small_config()
    });
    let way = cache.warm_up_fill(9, T1, None, LineStatus::Exclusive, 0);
    assert_eq!(*cache.get_line_data(9, way, 5), 0);

    cache.set_line_data(9, way, 5, 0xfeed);
    assert_eq!(*cache.get_line_data(9, way, 5), 0xfeed);
    let line = cache.way_line_state(9, way);
    assert!(line.is_dirty_object(5));
    assert!(!line.is_dirty_object(4));
}

#[test]
fn line_data_of_any_type() {
    let registry = Arc::new(SyncCacheManager::new());
    let config = CacheConfig {
        with_data: true,
        ..small_config()
    };
    let Ok(mut cache) = Cache::<_, String>::new(&config, registry) else {
        panic!("valid configuration rejected");
    };
    let way = cache.warm_up_fill(0, T1, None, LineStatus::Exclusive, 0);
    cache.set_line_data(0, way, 0, "payload".to_owned());
    assert_eq!(cache.get_line_data(0, way, 0), "payload");
}

#[test]
#[should_panic(expected = "is not valid")]
fn line_data_requires_valid_object() {
    let mut cache: Cache = cache(&CacheConfig {
        with_data: true,
        ..small_config()
    });
    let way = fill(&mut cache, 0, T1);
    cache.get_way_line_state(0, way).set_valid_object(3, false);
    cache.set_line_data(0, way, 3, 1);
}

#[test]
#[should_panic(expected = "built without line data")]
fn line_data_requires_data_mode() {
    let cache = cache(&small_config());
    let _ = cache.get_line_data(0, 0, 0);
}

// ══════════════════════════════════════════════════════════
// 5. Clearing
// ══════════════════════════════════════════════════════════

#[test]
fn clear_all_lines_keeps_perfect_lines() {
    let mut cache = cache(&small_config());
    let _ = fill(&mut cache, 0, T1);
    let _ = fill(&mut cache, 0, T2);
    let _ = fill(&mut cache, 7, T3);
    cache.set_line_status(0, 1, LineStatus::Perfect);

    cache.clear_all_lines();

    let kept = cache.way_line_state(0, 1);
    assert_eq!((kept.tag(), kept.status()), (T2, LineStatus::Perfect));
    for (index, way) in [(0, 0), (7, 0)] {
        let line = cache.way_line_state(index, way);
        assert_eq!(line.tag(), CLEARED_TAG);
        assert_eq!(line.status(), LineStatus::Invalid);
        assert_eq!(line.valid_mask(), 0);
    }

    let registry = cache.registry();
    assert_eq!(registry.owner_status("L1", 0, 0, T1), LineStatus::Invalid);
    assert_eq!(registry.owner_status("L1", 0, 7, T3), LineStatus::Invalid);
    assert!(cache.get_line_state(0, T1).is_none());
}

#[test]
fn clear_all_lines_erases_registry_entries_in_clear_mode() {
    let mut cache = cache(&small_config());
    cache.registry().set_clear_lines(true);
    let _ = fill(&mut cache, 0, T1);
    assert_eq!(cache.registry().tracked_lines("L1"), 1);
    cache.clear_all_lines();
    assert_eq!(cache.registry().tracked_lines("L1"), 0);
    assert!(!cache.registry().is_valid("L1", 0, T1));
}

// ══════════════════════════════════════════════════════════
// 6. Tag Uniqueness
// ══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Op {
    Lookup(usize, u64),
    Fill(usize, u64),
    Invalidate(usize, usize),
    Reserve(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    let set = 0..4usize;
    let tag = (1..6u64).prop_map(|t| t << 16);
    prop_oneof![
        (set.clone(), tag.clone()).prop_map(|(s, t)| Op::Lookup(s, t)),
        (set.clone(), tag).prop_map(|(s, t)| Op::Fill(s, t)),
        (set.clone(), 0..4usize).prop_map(|(s, w)| Op::Invalidate(s, w)),
        (set, 0..4usize).prop_map(|(s, w)| Op::Reserve(s, w)),
    ]
}

proptest! {
    /// No sequence of lookups, fills and status changes leaves a tag live in two ways.
    #[test]
    fn live_tags_stay_unique(
        warm in prop::sample::select(vec![0u32, 50, 100]),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let config = CacheConfig {
            warm_percent: warm,
            ..config(4, 4, 8)
        };
        let mut cache = cache(&config);
        for op in ops {
            match op {
                Op::Lookup(set, tag) => {
                    let _ = cache.get_line_state(set, tag);
                }
                Op::Fill(set, tag) => {
                    let _ = cache.warm_up_fill(set, tag, None, LineStatus::Exclusive, 0);
                }
                Op::Invalidate(set, way) => cache.set_line_status(set, way, LineStatus::Invalid),
                Op::Reserve(set, way) => {
                    // Keep at least one way free for victims.
                    let reserved = cache
                        .set_lines(set)
                        .iter()
                        .filter(|l| l.status() == LineStatus::Reserved)
                        .count();
                    if reserved < 3 {
                        cache.set_line_status(set, way, LineStatus::Reserved);
                    }
                }
            }
            for set in 0..4 {
                let mut live = cache
                    .set_lines(set)
                    .iter()
                    .filter(|l| l.status().is_live())
                    .map(|l| l.tag())
                    .collect::<Vec<_>>();
                let before = live.len();
                live.sort_unstable();
                live.dedup();
                prop_assert_eq!(live.len(), before, "set {} holds a tag twice", set);
            }
        }
    }
}
