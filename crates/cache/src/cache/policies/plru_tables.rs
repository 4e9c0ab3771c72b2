//! Pseudo-LRU mask/compare tables.
//!
//! Each supported way count maps to one binary tree. Internal nodes are
//! numbered in pre-order and occupy one bit of the packed per-set state; a set
//! bit means "the pseudo-LRU way lies in the right subtree". A node over `n`
//! ways puts `n / 2` ways on the left and the rest on the right, so 3-way
//! nodes split 1 + 2 and 6-, 12- and 24-way trees are pairs of 3-way subtrees
//! stacked under balanced levels.
//!
//! For way `w`:
//! - `mask[w]` selects the nodes on the root-to-leaf path of `w`.
//! - `compare[w]` is the value of those nodes when every one points at `w`,
//!   i.e. when `w` is the pseudo-LRU way.
//!
//! Making `w` most recently used writes the complement of `compare[w]` into
//! the masked bits so every node on the path points away from it. Lookups use
//! separate find tables: the bits that must be one (`find_ones`) and the bits
//! that must be zero (`find_zeros`) for `w` to be the victim.

/// Way counts served from the fixed tables.
pub const SUPPORTED_WAYS: [usize; 8] = [2, 3, 4, 6, 8, 12, 16, 24];

/// Per-way PLRU bit patterns for one tree shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlruTable {
    /// Path bits of each way.
    pub mask: Vec<u64>,
    /// Path value that makes each way the pseudo-LRU.
    pub compare: Vec<u64>,
    /// Bits written on `make_mru` (within `mask`).
    pub update: Vec<u64>,
    /// Bits that must be one for the way to be the victim.
    pub find_ones: Vec<u64>,
    /// Bits that must be zero for the way to be the victim.
    pub find_zeros: Vec<u64>,
}

impl PlruTable {
    fn from_mask_compare(mask: &[u64], compare: &[u64]) -> Self {
        let update = mask.iter().zip(compare).map(|(m, c)| m & !c).collect::<Vec<_>>();
        Self {
            mask: mask.to_vec(),
            compare: compare.to_vec(),
            find_ones: compare.iter().zip(mask).map(|(c, m)| c & m).collect(),
            find_zeros: update.clone(),
            update,
        }
    }

    /// Number of ways covered.
    pub fn ways(&self) -> usize {
        self.mask.len()
    }

    /// Fixed table for one of [`SUPPORTED_WAYS`].
    pub fn lookup(ways: usize) -> Option<Self> {
        let (mask, compare): (&[u64], &[u64]) = match ways {
            2 => (&MASK_2, &COMPARE_2),
            3 => (&MASK_3, &COMPARE_3),
            4 => (&MASK_4, &COMPARE_4),
            6 => (&MASK_6, &COMPARE_6),
            8 => (&MASK_8, &COMPARE_8),
            12 => (&MASK_12, &COMPARE_12),
            16 => (&MASK_16, &COMPARE_16),
            24 => (&MASK_24, &COMPARE_24),
            _ => return None,
        };
        Some(Self::from_mask_compare(mask, compare))
    }

    /// Builds the table for any way count in `1..=64` with the same tree rule.
    ///
    /// A single way has an empty tree: zero mask, always the victim.
    pub fn derive(ways: usize) -> Self {
        assert!((1..=64).contains(&ways), "PLRU supports 1..=64 ways, got {ways}");
        let mut mask = vec![0u64; ways];
        let mut compare = vec![0u64; ways];
        let mut next_node = 0u32;
        derive_subtree(0, ways, 0, 0, &mut next_node, &mut mask, &mut compare);
        Self::from_mask_compare(&mask, &compare)
    }

    /// Fixed table when available, derived otherwise.
    pub fn for_ways(ways: usize) -> Self {
        Self::lookup(ways).unwrap_or_else(|| Self::derive(ways))
    }
}

/// Assigns path bits to ways `lo..hi` under a node reached with `path_mask`/`path_compare`.
fn derive_subtree(
    lo: usize,
    hi: usize,
    path_mask: u64,
    path_compare: u64,
    next_node: &mut u32,
    mask: &mut [u64],
    compare: &mut [u64],
) {
    if hi - lo == 1 {
        mask[lo] = path_mask;
        compare[lo] = path_compare;
        return;
    }
    let bit = 1u64 << *next_node;
    *next_node += 1;
    let mid = lo + (hi - lo) / 2;
    derive_subtree(lo, mid, path_mask | bit, path_compare, next_node, mask, compare);
    derive_subtree(mid, hi, path_mask | bit, path_compare | bit, next_node, mask, compare);
}

// 2 ways, 1 tree node.
const MASK_2: [u64; 2] = [
    0x000001, 0x000001,
];
const COMPARE_2: [u64; 2] = [
    0x000000, 0x000001,
];

// 3 ways, 2 tree nodes.
const MASK_3: [u64; 3] = [
    0x000001, 0x000003, 0x000003,
];
const COMPARE_3: [u64; 3] = [
    0x000000, 0x000001, 0x000003,
];

// 4 ways, 3 tree nodes.
const MASK_4: [u64; 4] = [
    0x000003, 0x000003, 0x000005, 0x000005,
];
const COMPARE_4: [u64; 4] = [
    0x000000, 0x000002, 0x000001, 0x000005,
];

// 6 ways, 5 tree nodes.
const MASK_6: [u64; 6] = [
    0x000003, 0x000007, 0x000007, 0x000009, 0x000019, 0x000019,
];
const COMPARE_6: [u64; 6] = [
    0x000000, 0x000002, 0x000006, 0x000001, 0x000009, 0x000019,
];

// 8 ways, 7 tree nodes.
const MASK_8: [u64; 8] = [
    0x000007, 0x000007, 0x00000b, 0x00000b, 0x000031, 0x000031,
    0x000051, 0x000051,
];
const COMPARE_8: [u64; 8] = [
    0x000000, 0x000004, 0x000002, 0x00000a, 0x000001, 0x000021,
    0x000011, 0x000051,
];

// 12 ways, 11 tree nodes.
const MASK_12: [u64; 12] = [
    0x000007, 0x00000f, 0x00000f, 0x000013, 0x000033, 0x000033,
    0x0000c1, 0x0001c1, 0x0001c1, 0x000241, 0x000641, 0x000641,
];
const COMPARE_12: [u64; 12] = [
    0x000000, 0x000004, 0x00000c, 0x000002, 0x000012, 0x000032,
    0x000001, 0x000081, 0x000181, 0x000041, 0x000241, 0x000641,
];

// 16 ways, 15 tree nodes.
const MASK_16: [u64; 16] = [
    0x00000f, 0x00000f, 0x000017, 0x000017, 0x000063, 0x000063,
    0x0000a3, 0x0000a3, 0x000701, 0x000701, 0x000b01, 0x000b01,
    0x003101, 0x003101, 0x005101, 0x005101,
];
const COMPARE_16: [u64; 16] = [
    0x000000, 0x000008, 0x000004, 0x000014, 0x000002, 0x000042,
    0x000022, 0x0000a2, 0x000001, 0x000401, 0x000201, 0x000a01,
    0x000101, 0x002101, 0x001101, 0x005101,
];

// 24 ways, 23 tree nodes.
const MASK_24: [u64; 24] = [
    0x00000f, 0x00001f, 0x00001f, 0x000027, 0x000067, 0x000067,
    0x000183, 0x000383, 0x000383, 0x000483, 0x000c83, 0x000c83,
    0x007001, 0x00f001, 0x00f001, 0x013001, 0x033001, 0x033001,
    0x0c1001, 0x1c1001, 0x1c1001, 0x241001, 0x641001, 0x641001,
];
const COMPARE_24: [u64; 24] = [
    0x000000, 0x000008, 0x000018, 0x000004, 0x000024, 0x000064,
    0x000002, 0x000102, 0x000302, 0x000082, 0x000482, 0x000c82,
    0x000001, 0x004001, 0x00c001, 0x002001, 0x012001, 0x032001,
    0x001001, 0x081001, 0x181001, 0x041001, 0x241001, 0x641001,
];
