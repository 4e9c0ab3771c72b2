//! Process-wide default seeds.
//!
//! Caches built without an explicit seed take the next value of a shared
//! counter. Construction order therefore fixes every stream, which keeps
//! lockstepped and replayed runs bit-for-bit identical while still giving each
//! instance a different stream.

use std::sync::atomic::{AtomicU64, Ordering};

/// First seed handed out by [`next_default_seed`].
pub const DEFAULT_SEED_BASE: u64 = 0x5eed_0000;

static NEXT_SEED: AtomicU64 = AtomicU64::new(DEFAULT_SEED_BASE);

/// Returns the next default seed.
pub fn next_default_seed() -> u64 {
    NEXT_SEED.fetch_add(1, Ordering::Relaxed)
}
