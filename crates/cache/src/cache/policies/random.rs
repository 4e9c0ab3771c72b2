//! Random Replacement Policies.
//!
//! `RandomPolicy` evicts a uniformly chosen way; `RandomNotMruPolicy` does the
//! same over every way except the most recently used one. Both draw from a
//! private ChaCha stream seeded at construction, so a run is reproducible
//! given the seed no matter how host threads interleave.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{ReplacementPolicy, WayMask, all_ways, assert_not_all_reserved};

/// Stream id for replacement draws, distinct from the cache's warm-up stream.
const POLICY_STREAM: u64 = 1;

/// Stream id for `lru_way` queries, so they never shift the victim sequence.
const QUERY_STREAM: u64 = 2;

fn policy_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Picks uniformly among the ways set in `candidates`.
fn pick(rng: &mut ChaCha8Rng, candidates: WayMask) -> usize {
    let nth = rng.random_range(0..candidates.count_ones());
    let mut left = candidates;
    for _ in 0..nth {
        left &= left - 1;
    }
    left.trailing_zeros() as usize
}

/// Random Policy state.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    ways: usize,
    mru: Vec<u8>,
    rng: ChaCha8Rng,
    query: ChaCha8Rng,
}

impl RandomPolicy {
    /// Creates a new Random policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    /// * `seed` - Seed of the private PRNG stream.
    pub fn new(sets: usize, ways: usize, seed: u64) -> Self {
        Self {
            ways,
            mru: vec![0; sets],
            rng: policy_rng(seed, POLICY_STREAM),
            query: policy_rng(seed, QUERY_STREAM),
        }
    }
}

impl ReplacementPolicy for RandomPolicy {
    /// Records the MRU way; ordering is not tracked.
    fn make_mru(&mut self, set: usize, way: usize) {
        self.mru[set] = way as u8;
    }

    fn get_victim(&mut self, _set: usize, reserved: WayMask) -> usize {
        assert_not_all_reserved(reserved, self.ways);
        pick(&mut self.rng, all_ways(self.ways) & !reserved)
    }

    fn lru_way(&mut self, _set: usize) -> usize {
        self.query.random_range(0..self.ways)
    }

    fn mru_way(&self, set: usize) -> usize {
        self.mru[set] as usize
    }

    fn name(&self) -> &'static str {
        "Random"
    }
}

/// Random-not-MRU Policy state.
#[derive(Debug, Clone)]
pub struct RandomNotMruPolicy {
    ways: usize,
    mru: Vec<u8>,
    rng: ChaCha8Rng,
    query: ChaCha8Rng,
}

impl RandomNotMruPolicy {
    /// Creates a new Random-not-MRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity; must be at least two.
    /// * `seed` - Seed of the private PRNG stream.
    pub fn new(sets: usize, ways: usize, seed: u64) -> Self {
        assert!(ways > 1, "RandomNotMRU replacement requires more than one way");
        Self {
            ways,
            mru: vec![0; sets],
            rng: policy_rng(seed, POLICY_STREAM),
            query: policy_rng(seed, QUERY_STREAM),
        }
    }
}

impl ReplacementPolicy for RandomNotMruPolicy {
    fn make_mru(&mut self, set: usize, way: usize) {
        assert!(way < self.ways, "way {way} out of range for a {}-way set", self.ways);
        self.mru[set] = way as u8;
    }

    /// Picks among the `ways - 1` non-MRU ways. Falls back to the MRU way only
    /// when every other way is reserved.
    fn get_victim(&mut self, set: usize, reserved: WayMask) -> usize {
        assert_not_all_reserved(reserved, self.ways);
        let mru = self.mru[set] as usize;
        let candidates = all_ways(self.ways) & !reserved & !(1 << mru);
        if candidates == 0 {
            return mru;
        }
        pick(&mut self.rng, candidates)
    }

    fn lru_way(&mut self, set: usize) -> usize {
        let mru = self.mru[set] as usize;
        pick(&mut self.query, all_ways(self.ways) & !(1 << mru))
    }

    fn mru_way(&self, set: usize) -> usize {
        self.mru[set] as usize
    }

    fn name(&self) -> &'static str {
        "RandomNotMRU"
    }
}
