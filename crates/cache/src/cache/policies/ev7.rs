//! EV7-style touched-bit Replacement Policy.
//!
//! Each set keeps one bit per way, set when the way is made MRU. The victim is
//! the lowest way whose bit is clear and which is not reserved. When every
//! way is either touched or reserved, the touched bits are dropped and the
//! search repeats with only the reservations excluded.

use super::{ReplacementPolicy, WayMask, all_ways, assert_not_all_reserved};

/// EV7 Policy state.
#[derive(Debug, Clone)]
pub struct Ev7Policy {
    touched: Vec<WayMask>,
    mru: Vec<u8>,
    ways: usize,
}

impl Ev7Policy {
    /// Creates a new EV7 policy instance with every way untouched.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            touched: vec![0; sets],
            mru: vec![0; sets],
            ways,
        }
    }

    /// Touched bits of `set`.
    pub fn touched(&self, set: usize) -> WayMask {
        self.touched[set]
    }
}

impl ReplacementPolicy for Ev7Policy {
    fn make_mru(&mut self, set: usize, way: usize) {
        assert!(way < self.ways, "way {way} out of range for a {}-way set", self.ways);
        self.touched[set] |= 1 << way;
        self.mru[set] = way as u8;
    }

    fn get_victim(&mut self, set: usize, reserved: WayMask) -> usize {
        assert_not_all_reserved(reserved, self.ways);
        let all = all_ways(self.ways);
        let mut free = all & !(self.touched[set] | reserved);
        if free == 0 {
            self.touched[set] = 0;
            free = all & !reserved;
        }
        free.trailing_zeros() as usize
    }

    /// Next victim without resetting the touched bits.
    fn lru_way(&mut self, set: usize) -> usize {
        let free = all_ways(self.ways) & !self.touched[set];
        if free == 0 { 0 } else { free.trailing_zeros() as usize }
    }

    fn mru_way(&self, set: usize) -> usize {
        self.mru[set] as usize
    }

    fn name(&self) -> &'static str {
        "EV7"
    }
}
