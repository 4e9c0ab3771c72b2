//! Associative cache simulation engine.
//!
//! This crate implements the tag/state array at the heart of a cycle-accurate
//! cache model:
//! 1. **Tag array:** An (index × way) array of line states with classical and
//!    shifted address decomposition and an optional object data array.
//! 2. **Replacement:** True LRU, tree pseudo-LRU, random, random-not-MRU and
//!    EV7 touched-bit victim selection, with reservation masks.
//! 3. **Warm-up sampling:** Probabilistic population of `Warm` slots on a miss,
//!    from a per-instance seeded stream, to remove cold-start bias in sampled
//!    simulation.
//! 4. **Coherence registry:** A per-level (index, tag) → owner → status table
//!    shared by sibling caches, with a mutex-guarded variant for caches driven
//!    from several host threads.
//!
//! Misuse of a constructed cache (out-of-range index or way, two live ways
//! holding one tag, a victim search with every way reserved, writing data
//! into an invalid object) is a caller bug and panics. A miss is `None`.

/// Tag array, address mapping, line state and replacement policies.
pub mod cache;
/// Cross-cache coherence registry.
pub mod coherence;
/// Line status, constants and configuration errors.
pub mod common;
/// Cache configuration.
pub mod config;
/// Notification hook for external tracers.
pub mod events;

/// Tag array; build with `Cache::new(&config, registry)`.
pub use crate::cache::Cache;
/// Single-threaded and thread-safe registries.
pub use crate::coherence::{CacheManager, CoherenceRegistry, SyncCacheManager};
/// Per-line status.
pub use crate::common::LineStatus;
/// Construction parameters.
pub use crate::config::CacheConfig;
