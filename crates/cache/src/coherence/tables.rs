//! Per-level line ownership tables.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::common::LineStatus;

/// Owners of one (index, tag) and the status each last set.
pub type OwnerMap = BTreeMap<u32, LineStatus>;

type LineTable = HashMap<(usize, u64), OwnerMap>;

/// Every registered level's table plus the registry-wide switches.
///
/// This is the unsynchronized core shared by
/// [`CacheManager`](super::CacheManager) and
/// [`SyncCacheManager`](super::SyncCacheManager).
#[derive(Debug)]
pub struct LevelTables {
    levels: HashMap<String, LineTable>,
    active: bool,
    clear_lines: bool,
}

impl Default for LevelTables {
    fn default() -> Self {
        Self {
            levels: HashMap::new(),
            active: true,
            clear_lines: false,
        }
    }
}

impl LevelTables {
    /// Creates the table for `level` if absent. Returns true if it was created.
    pub fn register(&mut self, level: &str) -> bool {
        if self.levels.contains_key(level) {
            return false;
        }
        debug!(level, "registering cache level");
        let _ = self.levels.insert(level.to_owned(), LineTable::new());
        true
    }

    fn table_mut(&mut self, level: &str) -> &mut LineTable {
        let _ = self.register(level);
        self.levels
            .get_mut(level)
            .unwrap_or_else(|| unreachable!("level {level} was just registered"))
    }

    fn owners_of(&self, level: &str, index: usize, tag: u64) -> Option<&OwnerMap> {
        self.levels.get(level)?.get(&(index, tag))
    }

    /// Aggregate status: `Invalid` if untracked, `Exclusive` with one owner,
    /// `Shared` with more.
    ///
    /// This only counts owners; it does not synthesize a coherence state from
    /// the per-owner statuses.
    pub fn status(&self, level: &str, index: usize, tag: u64) -> LineStatus {
        match self.owners_of(level, index, tag).map(BTreeMap::len) {
            None | Some(0) => LineStatus::Invalid,
            Some(1) => LineStatus::Exclusive,
            Some(_) => LineStatus::Shared,
        }
    }

    /// Status last set by `owner`, or `Invalid`.
    pub fn owner_status(&self, level: &str, owner: u32, index: usize, tag: u64) -> LineStatus {
        self.owners_of(level, index, tag)
            .and_then(|owners| owners.get(&owner).copied())
            .unwrap_or(LineStatus::Invalid)
    }

    /// True when the line has at least one recorded owner.
    pub fn is_valid(&self, level: &str, index: usize, tag: u64) -> bool {
        self.owners_of(level, index, tag).is_some_and(|owners| !owners.is_empty())
    }

    /// True when an owner other than `owner` holds the line in a live status.
    pub fn held_elsewhere(&self, level: &str, owner: u32, index: usize, tag: u64) -> bool {
        self.owners_of(level, index, tag).is_some_and(|owners| {
            owners
                .iter()
                .any(|(&other, status)| other != owner && status.is_live())
        })
    }

    /// Records `status` for `owner`.
    ///
    /// With clear-lines mode on, an `Invalid` or `Reserved` status removes the
    /// owner instead, and the line entry goes away with its last owner. With it
    /// off, the status is stored like any other. Ignored while deactivated.
    pub fn set_status(
        &mut self,
        level: &str,
        owner: u32,
        index: usize,
        tag: u64,
        status: LineStatus,
    ) {
        if !self.active {
            return;
        }
        let clear = self.clear_lines && status.is_clearing();
        let table = self.table_mut(level);
        if clear {
            let Some(owners) = table.get_mut(&(index, tag)) else {
                return;
            };
            let _ = owners.remove(&owner);
            if owners.is_empty() {
                let _ = table.remove(&(index, tag));
                debug!(level, index, tag, "erased line with no remaining owners");
            }
        } else {
            let _ = table.entry((index, tag)).or_default().insert(owner, status);
        }
    }

    /// Snapshot of the owners of a line.
    pub fn owners(&self, level: &str, index: usize, tag: u64) -> OwnerMap {
        self.owners_of(level, index, tag).cloned().unwrap_or_default()
    }

    /// Number of (index, tag) entries tracked for `level`.
    pub fn tracked_lines(&self, level: &str) -> usize {
        self.levels.get(level).map_or(0, HashMap::len)
    }

    /// Registered level names, sorted.
    pub fn level_names(&self) -> Vec<String> {
        let mut names = self.levels.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Turns every later `set_status` into a no-op. Tables are kept.
    pub fn deactivate(&mut self) {
        debug!("cache manager deactivated");
        self.active = false;
    }

    /// Re-enables `set_status` after [`deactivate`](Self::deactivate).
    pub const fn activate(&mut self) {
        self.active = true;
    }

    /// Whether updates are recorded.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enables or disables eager erasing on `Invalid`/`Reserved`.
    pub const fn set_clear_lines(&mut self, on: bool) {
        self.clear_lines = on;
    }

    /// Whether eager erasing is on.
    pub const fn clear_lines(&self) -> bool {
        self.clear_lines
    }
}
