//! Address Mapping Tests.
//!
//! Verifies index/tag/position extraction for the classical (quadword) and
//! shifted schemes, and that `original` rebuilds line addresses.

use proptest::prelude::*;
use waysim_core::cache::AddressMap;
use waysim_core::common::CLEARED_TAG;

// ══════════════════════════════════════════════════════════
// 1. Classical mapping
// ══════════════════════════════════════════════════════════

/// 4-way, 16 sets, 8 objects: 64-byte lines, 1 KiB per way.
#[test]
fn classical_worked_example() {
    let map = AddressMap::new(16, 8);

    assert_eq!(map.classical_pos(0x10000), 0);
    assert_eq!(map.classical_index(0x10000), 0);
    assert_eq!(map.classical_tag(0x10000), 0x10000);

    // 0x10048: quadword 9 → pos 1 of line 0x401 → set 1.
    assert_eq!(map.classical_pos(0x10048), 1);
    assert_eq!(map.classical_index(0x10048), 1);
    assert_eq!(map.classical_tag(0x10048), 0x10000);
}

/// Byte offsets inside a quadword do not change the position.
#[test]
fn classical_ignores_byte_offset() {
    let map = AddressMap::new(16, 8);
    for byte in 0..8 {
        assert_eq!(map.classical_pos(0x2010 + byte), 2);
    }
}

/// A non-power-of-two set count rounds the index mask up.
#[test]
fn index_mask_rounds_up() {
    assert_eq!(AddressMap::new(100, 8).index_mask(), 127);
    assert_eq!(AddressMap::new(128, 8).index_mask(), 127);
    assert_eq!(AddressMap::new(1, 8).index_mask(), 0);
}

/// The tag keeps every bit above one way's span, in place.
#[test]
fn classical_tag_clears_index_and_offset() {
    let map = AddressMap::new(100, 4);
    // 128 sets * 4 objects * 8 bytes = 4 KiB per way.
    assert_eq!(map.classical_tag(0xABCD_EFFF), 0xABCD_E000);
}

// ══════════════════════════════════════════════════════════
// 2. Shifted mapping
// ══════════════════════════════════════════════════════════

#[test]
fn shifted_skips_no_byte_bits() {
    let map = AddressMap::new(16, 4);

    assert_eq!(map.shifted_pos(0x123), 3);
    assert_eq!(map.shifted_index(0x123), (0x123 >> 2) & 15);
    assert_eq!(map.shifted_tag(0x123), 0x100);
}

#[test]
fn shifted_and_classical_differ_by_three_bits() {
    let map = AddressMap::new(64, 8);
    let addr = 0x0003_4560;
    assert_eq!(map.classical_index(addr), map.shifted_index(addr >> 3));
    assert_eq!(map.classical_pos(addr), map.shifted_pos(addr >> 3));
    assert_eq!(map.classical_tag(addr) >> 3, map.shifted_tag(addr >> 3));
}

// ══════════════════════════════════════════════════════════
// 3. Reconstruction
// ══════════════════════════════════════════════════════════

/// The cleared-line sentinel is exempt from reconstruction checks.
#[test]
fn cleared_tag_is_exempt() {
    let map = AddressMap::new(16, 8);
    let addr = map.classical_original(3, CLEARED_TAG);
    assert_eq!(addr, CLEARED_TAG | (3 << 6));
}

#[test]
#[should_panic(expected = "power of two")]
fn non_power_of_two_objects_rejected() {
    let _ = AddressMap::new(16, 6);
}

proptest! {
    #[test]
    fn classical_round_trip(
        addr in any::<u64>(),
        lines in 1usize..4096,
        object_bits in 0u32..=6,
    ) {
        let objects = 1usize << object_bits;
        let map = AddressMap::new(lines, objects);
        let line_addr = addr & !((objects as u64 * 8) - 1);
        let index = map.classical_index(line_addr);
        let tag = map.classical_tag(line_addr);
        prop_assert_eq!(map.classical_original(index, tag), line_addr);
    }

    #[test]
    fn shifted_round_trip(
        addr in any::<u64>(),
        lines in 1usize..4096,
        object_bits in 0u32..=6,
    ) {
        let objects = 1usize << object_bits;
        let map = AddressMap::new(lines, objects);
        let line_addr = addr & !(objects as u64 - 1);
        let index = map.shifted_index(line_addr);
        let tag = map.shifted_tag(line_addr);
        prop_assert_eq!(map.shifted_original(index, tag), line_addr);
    }
}
