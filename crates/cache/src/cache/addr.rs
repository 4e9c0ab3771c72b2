//! Address decomposition into (index, tag, position).
//!
//! Two schemes are supported:
//! 1. **Classical:** objects are 8-byte quadwords, so the low three address bits
//!    select a byte within the object and are skipped.
//! 2. **Shifted:** the caller pre-shifts addresses by the object size (compact
//!    directory entries and the like), so no byte offset is skipped.
//!
//! Tags keep the address bits above the index field in place rather than
//! shifting them down, so `original(index(a), tag(a))` rebuilds a line-aligned
//! address by OR-ing the index back in.

use crate::common::CLEARED_TAG;
use crate::common::constants::QUADWORD_SHIFT;

/// Mapping scheme for a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mapping {
    /// Addresses name bytes of 8-byte objects.
    #[default]
    Classical,
    /// Addresses are already expressed in object units.
    Shifted,
}

impl Mapping {
    const fn byte_shift(self) -> u32 {
        match self {
            Self::Classical => QUADWORD_SHIFT,
            Self::Shifted => 0,
        }
    }
}

/// Precomputed masks and shifts for one cache geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    object_bits: u32,
    pos_mask: u64,
    index_mask: u64,
    /// `ceil_pow2(lines_per_way) * objects_per_line`, the span of one way in objects.
    way_span: u64,
}

impl AddressMap {
    /// Builds the map for `lines_per_way` sets of `objects_per_line` objects.
    ///
    /// `objects_per_line` must be a power of two; configuration validation
    /// guarantees this before a cache is built.
    pub fn new(lines_per_way: usize, objects_per_line: usize) -> Self {
        assert!(
            objects_per_line.is_power_of_two(),
            "objects per line must be a power of two, got {objects_per_line}"
        );
        let lines = lines_per_way.max(1).next_power_of_two() as u64;
        let objects = objects_per_line as u64;
        Self {
            object_bits: objects_per_line.trailing_zeros(),
            pos_mask: objects - 1,
            index_mask: lines - 1,
            way_span: lines * objects,
        }
    }

    /// Mask applied to the index field (`ceil_pow2(lines_per_way) - 1`).
    #[inline]
    pub const fn index_mask(&self) -> u64 {
        self.index_mask
    }

    /// Object position within the line.
    #[inline(always)]
    pub const fn pos(&self, mapping: Mapping, addr: u64) -> usize {
        ((addr >> mapping.byte_shift()) & self.pos_mask) as usize
    }

    /// Set index.
    ///
    /// Callers with a non-power-of-two set count must keep the result below
    /// `lines_per_way`; the cache asserts it on lookup.
    #[inline(always)]
    pub const fn index(&self, mapping: Mapping, addr: u64) -> usize {
        ((addr >> (self.object_bits + mapping.byte_shift())) & self.index_mask) as usize
    }

    /// Tag: the address with index, position and byte bits cleared.
    #[inline(always)]
    pub const fn tag(&self, mapping: Mapping, addr: u64) -> u64 {
        addr & !((self.way_span << mapping.byte_shift()) - 1)
    }

    /// Rebuilds the line-aligned address from an index and a tag.
    #[inline]
    pub fn original(&self, mapping: Mapping, index: usize, tag: u64) -> u64 {
        let addr = tag | ((index as u64) << (self.object_bits + mapping.byte_shift()));
        debug_assert!(
            tag == CLEARED_TAG || (self.tag(mapping, addr) == tag && self.index(mapping, addr) == index),
            "index {index:#x} / tag {tag:#x} do not describe a line address"
        );
        addr
    }

    /// Classical [`pos`](Self::pos).
    #[inline]
    pub const fn classical_pos(&self, addr: u64) -> usize {
        self.pos(Mapping::Classical, addr)
    }

    /// Classical [`index`](Self::index).
    #[inline]
    pub const fn classical_index(&self, addr: u64) -> usize {
        self.index(Mapping::Classical, addr)
    }

    /// Classical [`tag`](Self::tag).
    #[inline]
    pub const fn classical_tag(&self, addr: u64) -> u64 {
        self.tag(Mapping::Classical, addr)
    }

    /// Classical [`original`](Self::original).
    #[inline]
    pub fn classical_original(&self, index: usize, tag: u64) -> u64 {
        self.original(Mapping::Classical, index, tag)
    }

    /// Shifted [`pos`](Self::pos).
    #[inline]
    pub const fn shifted_pos(&self, addr: u64) -> usize {
        self.pos(Mapping::Shifted, addr)
    }

    /// Shifted [`index`](Self::index).
    #[inline]
    pub const fn shifted_index(&self, addr: u64) -> usize {
        self.index(Mapping::Shifted, addr)
    }

    /// Shifted [`tag`](Self::tag).
    #[inline]
    pub const fn shifted_tag(&self, addr: u64) -> u64 {
        self.tag(Mapping::Shifted, addr)
    }

    /// Shifted [`original`](Self::original).
    #[inline]
    pub fn shifted_original(&self, index: usize, tag: u64) -> u64 {
        self.original(Mapping::Shifted, index, tag)
    }
}
