//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! PLRU approximates the Least Recently Used algorithm using a binary tree of bits.
//! It requires significantly less storage than full LRU (N-1 bits for N ways).
//!
//! The tree is never walked at run time. Each set stores its node bits packed
//! in one `u64`, and a [`PlruTable`] gives, per way, the path mask, the
//! update pattern applied on access, and the find patterns that identify the
//! victim. See [`plru_tables`](super::plru_tables) for the encoding.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `make_mru()`: O(1)
//!   - `get_victim()`: O(W)
//! - **Space Complexity:** O(S) words
//! - **Hardware Cost:** Low - simple bit operations

use super::{PlruTable, ReplacementPolicy, WayMask, assert_not_all_reserved};

/// PLRU Policy state.
#[derive(Debug, Clone)]
pub struct PlruPolicy {
    /// Packed tree bits for each set.
    state: Vec<u64>,
    /// Last way made MRU in each set.
    mru: Vec<u8>,
    table: PlruTable,
}

impl PlruPolicy {
    /// Creates a new PLRU policy instance.
    ///
    /// Way counts with a fixed table use it; any other count up to 64 uses a
    /// derived table of the same shape. All sets start with every node bit
    /// clear, so way 0 is the first victim.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            state: vec![0; sets],
            mru: vec![0; sets],
            table: PlruTable::for_ways(ways),
        }
    }

    /// Packed tree bits of `set`.
    pub fn state(&self, set: usize) -> u64 {
        self.state[set]
    }

    /// Table in use.
    pub const fn table(&self) -> &PlruTable {
        &self.table
    }

    /// Pseudo-LRU way encoded by `state`.
    ///
    /// # Panics
    ///
    /// Panics if no way matches, which only a corrupted state can cause.
    pub fn lru_for_state(&self, state: u64) -> usize {
        let t = &self.table;
        (0..t.ways())
            .find(|&w| state & t.find_ones[w] == t.find_ones[w] && state & t.find_zeros[w] == 0)
            .unwrap_or_else(|| panic!("PLRU state {state:#x} matches no way"))
    }
}

impl ReplacementPolicy for PlruPolicy {
    /// Points every node on the path of `way` away from it.
    fn make_mru(&mut self, set: usize, way: usize) {
        let t = &self.table;
        assert!(way < t.ways(), "way {way} out of range for a {}-way set", t.ways());
        self.state[set] = (self.state[set] & !t.mask[way]) | t.update[way];
        self.mru[set] = way as u8;
    }

    /// Returns the pseudo-LRU way, or the next unreserved way after it.
    fn get_victim(&mut self, set: usize, reserved: WayMask) -> usize {
        let ways = self.table.ways();
        assert_not_all_reserved(reserved, ways);
        let lru = self.lru_for_state(self.state[set]);
        (0..ways)
            .map(|step| (lru + step) % ways)
            .find(|&w| reserved & (1 << w) == 0)
            .unwrap_or(lru)
    }

    fn lru_way(&mut self, set: usize) -> usize {
        self.lru_for_state(self.state[set])
    }

    fn mru_way(&self, set: usize) -> usize {
        self.mru[set] as usize
    }

    fn name(&self) -> &'static str {
        "PLRU"
    }
}
