//! Least Recently Used (LRU) Replacement Policy.
//!
//! Each set keeps a circular doubly linked list over its ways plus one
//! sentinel node. The sentinel's successor is the MRU way and its predecessor
//! the LRU way, so promoting or demoting a way is an O(1) unlink and relink.
//! All links for all sets live in two flat arrays of `sets * (ways + 1)` nodes.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `make_mru()` / `make_lru()`: O(1)
//!   - `get_victim()`: O(1) without reservations, O(W) worst case with them
//! - **Space Complexity:** O(S × W)

use super::{ReplacementPolicy, WayMask, assert_not_all_reserved};

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// Successor toward LRU.
    next: Vec<u8>,
    /// Predecessor toward MRU.
    prev: Vec<u8>,
    ways: usize,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// Every set starts ordered way 0 (MRU) through way `ways - 1` (LRU).
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        let stride = ways + 1;
        let mut next = vec![0u8; sets * stride];
        let mut prev = vec![0u8; sets * stride];
        for set in 0..sets {
            let base = set * stride;
            for node in 0..stride {
                next[base + node] = ((node + 1) % stride) as u8;
                prev[base + node] = ((node + stride - 1) % stride) as u8;
            }
        }
        Self { next, prev, ways }
    }

    #[inline]
    const fn sentinel(&self) -> usize {
        self.ways
    }

    #[inline]
    const fn base(&self, set: usize) -> usize {
        set * (self.ways + 1)
    }

    fn unlink(&mut self, base: usize, node: usize) {
        let p = self.prev[base + node] as usize;
        let n = self.next[base + node] as usize;
        self.next[base + p] = n as u8;
        self.prev[base + n] = p as u8;
    }

    /// Inserts `node` between `p` and its successor.
    fn link_after(&mut self, base: usize, p: usize, node: usize) {
        let n = self.next[base + p] as usize;
        self.next[base + node] = n as u8;
        self.prev[base + node] = p as u8;
        self.next[base + p] = node as u8;
        self.prev[base + n] = node as u8;
    }

    /// Ways of `set` from MRU to LRU.
    pub fn order(&self, set: usize) -> Vec<usize> {
        let base = self.base(set);
        let mut out = Vec::with_capacity(self.ways);
        let mut node = self.next[base + self.sentinel()] as usize;
        while node != self.sentinel() {
            out.push(node);
            node = self.next[base + node] as usize;
        }
        out
    }

    fn check_way(&self, way: usize) {
        assert!(way < self.ways, "way {way} out of range for a {}-way set", self.ways);
    }
}

impl ReplacementPolicy for LruPolicy {
    fn make_mru(&mut self, set: usize, way: usize) {
        self.check_way(way);
        let base = self.base(set);
        self.unlink(base, way);
        self.link_after(base, self.sentinel(), way);
    }

    fn make_lru(&mut self, set: usize, way: usize) {
        self.check_way(way);
        let base = self.base(set);
        self.unlink(base, way);
        let tail = self.prev[base + self.sentinel()] as usize;
        self.link_after(base, tail, way);
    }

    /// Walks from the LRU end toward MRU and returns the first unreserved way.
    fn get_victim(&mut self, set: usize, reserved: WayMask) -> usize {
        assert_not_all_reserved(reserved, self.ways);
        let base = self.base(set);
        let mut node = self.prev[base + self.sentinel()] as usize;
        while reserved & (1 << node) != 0 {
            node = self.prev[base + node] as usize;
        }
        node
    }

    fn lru_way(&mut self, set: usize) -> usize {
        self.prev[self.base(set) + self.sentinel()] as usize
    }

    fn mru_way(&self, set: usize) -> usize {
        self.next[self.base(set) + self.sentinel()] as usize
    }

    fn name(&self) -> &'static str {
        "LRU"
    }
}
