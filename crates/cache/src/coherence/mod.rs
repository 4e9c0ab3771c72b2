//! Cross-cache coherence registry (Cache Manager).
//!
//! Sibling caches of one level (for instance the per-socket L2s of a
//! multi-chip model) report every status they set here, keyed by level name,
//! (index, tag) and owner. Warm-up sampling consults the registry so that it
//! never manufactures a line that a sibling already holds.
//!
//! The registry is an explicit object shared through an `Arc` and handed to
//! each cache at construction. Two variants exist:
//! 1. [`CacheManager`]: interior `RefCell`, for single-threaded hosts.
//! 2. [`SyncCacheManager`]: one `Mutex` taken per call around the level lookup
//!    and the operation. Line state inside each cache is not locked; a line is
//!    assumed to be touched by one simulation thread at a time.

/// Level tables and registry switches.
pub mod tables;

use std::cell::RefCell;
use std::sync::{Mutex, PoisonError};

pub use tables::{LevelTables, OwnerMap};

use crate::common::LineStatus;

/// Access to a shared [`LevelTables`].
///
/// Implementors provide [`with_tables`](Self::with_tables); every registry
/// operation is expressed through it, so the locking granularity is exactly
/// one acquisition per call.
pub trait CoherenceRegistry {
    /// Runs `f` with exclusive access to the tables.
    fn with_tables<T>(&self, f: impl FnOnce(&mut LevelTables) -> T) -> T;

    /// Creates the table for `level` if absent.
    fn register(&self, level: &str) {
        let _ = self.with_tables(|t| t.register(level));
    }

    /// Aggregate status of a line (`Invalid`, `Exclusive` or `Shared`).
    fn status(&self, level: &str, index: usize, tag: u64) -> LineStatus {
        self.with_tables(|t| t.status(level, index, tag))
    }

    /// Status last set by `owner`.
    fn owner_status(&self, level: &str, owner: u32, index: usize, tag: u64) -> LineStatus {
        self.with_tables(|t| t.owner_status(level, owner, index, tag))
    }

    /// Records `status` for `owner`.
    fn set_status(&self, level: &str, owner: u32, index: usize, tag: u64, status: LineStatus) {
        self.with_tables(|t| t.set_status(level, owner, index, tag, status));
    }

    /// True when the line has at least one recorded owner.
    fn is_valid(&self, level: &str, index: usize, tag: u64) -> bool {
        self.with_tables(|t| t.is_valid(level, index, tag))
    }

    /// True when some owner other than `owner` holds the line live.
    fn held_elsewhere(&self, level: &str, owner: u32, index: usize, tag: u64) -> bool {
        self.with_tables(|t| t.held_elsewhere(level, owner, index, tag))
    }

    /// Snapshot of the owners of a line.
    fn owners(&self, level: &str, index: usize, tag: u64) -> OwnerMap {
        self.with_tables(|t| t.owners(level, index, tag))
    }

    /// Number of lines tracked for `level`.
    fn tracked_lines(&self, level: &str) -> usize {
        self.with_tables(|t| t.tracked_lines(level))
    }

    /// Registered level names, sorted.
    fn level_names(&self) -> Vec<String> {
        self.with_tables(|t| t.level_names())
    }

    /// Makes every later `set_status` a no-op.
    fn deactivate(&self) {
        self.with_tables(LevelTables::deactivate);
    }

    /// Undoes [`deactivate`](Self::deactivate).
    fn activate(&self) {
        self.with_tables(LevelTables::activate);
    }

    /// Whether updates are recorded.
    fn is_active(&self) -> bool {
        self.with_tables(|t| t.is_active())
    }

    /// Enables eager erasing on `Invalid`/`Reserved` transitions. Off by default.
    fn set_clear_lines(&self, on: bool) {
        self.with_tables(|t| t.set_clear_lines(on));
    }

    /// Whether eager erasing is on.
    fn clear_lines(&self) -> bool {
        self.with_tables(|t| t.clear_lines())
    }
}

/// Single-threaded registry.
#[derive(Debug, Default)]
pub struct CacheManager {
    tables: RefCell<LevelTables>,
}

impl CacheManager {
    /// Creates an empty, active registry with clear-lines mode off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoherenceRegistry for CacheManager {
    fn with_tables<T>(&self, f: impl FnOnce(&mut LevelTables) -> T) -> T {
        f(&mut *self.tables.borrow_mut())
    }
}

/// Thread-safe registry: one mutex acquisition per call.
#[derive(Debug, Default)]
pub struct SyncCacheManager {
    tables: Mutex<LevelTables>,
}

impl SyncCacheManager {
    /// Creates an empty, active registry with clear-lines mode off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoherenceRegistry for SyncCacheManager {
    fn with_tables<T>(&self, f: impl FnOnce(&mut LevelTables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *tables)
    }
}
