//! Constants shared by the tag array, the replacement policies and the registry.

/// Owner id meaning "no owner".
pub const UNOWNED: u32 = u32::MAX;

/// Tag written into cleared slots. Exempt from address reconstruction checks.
pub const CLEARED_TAG: u64 = 0xdead_beef;

/// Largest associativity; way masks are 64-bit.
pub const MAX_WAYS: usize = 64;

/// Largest line width in objects; valid and dirty vectors are 64-bit.
pub const MAX_OBJECTS_PER_LINE: usize = 64;

/// Bytes per object under classical (quadword) address mapping.
pub const QUADWORD_BYTES: u64 = 8;

/// log2 of [`QUADWORD_BYTES`].
pub const QUADWORD_SHIFT: u32 = 3;
