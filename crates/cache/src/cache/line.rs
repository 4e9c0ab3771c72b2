//! Per-slot line state.
//!
//! A `LineState` is one (index, way) entry of the tag array: the tag, the
//! owner that filled it, its coherence status, per-object valid and dirty
//! bits, and access statistics consumed by AVF accounting.

use crate::common::{LineStatus, UNOWNED};

/// Access statistics for a single slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessStats {
    /// Number of recorded accesses.
    pub accesses: u64,
    /// Sum of cycle distances between consecutive accesses.
    pub total_distance: u64,
    /// Cycle of the most recent access.
    pub last_cycle: u64,
}

impl AccessStats {
    /// Mean distance between consecutive accesses, or `None` with fewer than two.
    pub fn mean_distance(&self) -> Option<f64> {
        if self.accesses < 2 {
            return None;
        }
        Some(self.total_distance as f64 / (self.accesses - 1) as f64)
    }
}

/// State of one cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    tag: u64,
    way: u8,
    owner: u32,
    status: LineStatus,
    valid: u64,
    dirty: u64,
    object_mask: u64,
    stats: AccessStats,
}

impl LineState {
    /// Creates an empty slot for `way` holding `objects_per_line` objects.
    ///
    /// # Arguments
    ///
    /// * `way` - Way number of the slot within its set.
    /// * `objects_per_line` - Objects per line (1..=64).
    /// * `tag` - Initial tag, normally the cleared-line sentinel.
    /// * `status` - Initial status (`Invalid`, or `Warm` when sampling).
    pub fn new(way: u8, objects_per_line: usize, tag: u64, status: LineStatus) -> Self {
        let object_mask = if objects_per_line >= 64 {
            u64::MAX
        } else {
            (1u64 << objects_per_line) - 1
        };
        Self {
            tag,
            way,
            owner: UNOWNED,
            status,
            valid: 0,
            dirty: 0,
            object_mask,
            stats: AccessStats::default(),
        }
    }

    /// Address tag currently stored in the slot.
    #[inline]
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Replaces the stored tag.
    #[inline]
    pub const fn set_tag(&mut self, tag: u64) {
        self.tag = tag;
    }

    /// Way number of this slot.
    #[inline]
    pub const fn way(&self) -> usize {
        self.way as usize
    }

    /// Owner id, or [`UNOWNED`].
    #[inline]
    pub const fn owner(&self) -> u32 {
        self.owner
    }

    /// Sets the owner id.
    #[inline]
    pub const fn set_owner(&mut self, owner: u32) {
        self.owner = owner;
    }

    /// True when an owner has been recorded.
    #[inline]
    pub const fn is_owned(&self) -> bool {
        self.owner != UNOWNED
    }

    /// Current status.
    #[inline]
    pub const fn status(&self) -> LineStatus {
        self.status
    }

    /// Sets the status. A `Perfect` line ignores every later update.
    #[inline]
    pub fn set_status(&mut self, status: LineStatus) {
        if self.status != LineStatus::Perfect {
            self.status = status;
        }
    }

    /// Number of objects held by the line.
    #[inline]
    pub const fn objects_per_line(&self) -> usize {
        self.object_mask.count_ones() as usize
    }

    /// Valid bit-vector, one bit per object.
    #[inline]
    pub const fn valid_mask(&self) -> u64 {
        self.valid
    }

    /// Dirty bit-vector, one bit per object.
    #[inline]
    pub const fn dirty_mask(&self) -> u64 {
        self.dirty
    }

    /// Whether object `pos` holds valid data.
    #[inline]
    pub fn is_valid_object(&self, pos: usize) -> bool {
        self.check_pos(pos);
        self.valid & (1 << pos) != 0
    }

    /// Whether object `pos` has been written since the fill.
    #[inline]
    pub fn is_dirty_object(&self, pos: usize) -> bool {
        self.check_pos(pos);
        self.dirty & (1 << pos) != 0
    }

    /// Whether any object of the line is dirty.
    #[inline]
    pub const fn any_dirty(&self) -> bool {
        self.dirty != 0
    }

    /// Whether every object of the line is valid.
    #[inline]
    pub const fn all_valid(&self) -> bool {
        self.valid == self.object_mask
    }

    /// Sets or clears the valid bit of object `pos`.
    ///
    /// Clearing a valid bit also clears the matching dirty bit.
    pub fn set_valid_object(&mut self, pos: usize, valid: bool) {
        self.check_pos(pos);
        if valid {
            self.valid |= 1 << pos;
        } else {
            self.valid &= !(1 << pos);
            self.dirty &= !(1 << pos);
        }
    }

    /// Marks every object valid.
    #[inline]
    pub const fn validate_all(&mut self) {
        self.valid = self.object_mask;
    }

    /// Marks object `pos` dirty.
    ///
    /// # Panics
    ///
    /// Panics if the object is not valid.
    pub fn mark_dirty(&mut self, pos: usize) {
        assert!(
            self.is_valid_object(pos),
            "object {pos} of way {} is not valid and cannot be dirtied",
            self.way
        );
        self.dirty |= 1 << pos;
    }

    /// Marks every object dirty. Only valid objects are affected.
    #[inline]
    pub const fn mark_all_dirty(&mut self) {
        self.dirty = self.valid;
    }

    /// Clears the dirty bit of object `pos`.
    pub fn clean_object(&mut self, pos: usize) {
        self.check_pos(pos);
        self.dirty &= !(1 << pos);
    }

    /// Clears every valid and dirty bit.
    #[inline]
    pub const fn clear_objects(&mut self) {
        self.valid = 0;
        self.dirty = 0;
    }

    /// Access statistics.
    #[inline]
    pub const fn stats(&self) -> &AccessStats {
        &self.stats
    }

    /// Records an access at `cycle`, accumulating the distance from the previous one.
    pub const fn record_access(&mut self, cycle: u64) {
        if self.stats.accesses > 0 {
            self.stats.total_distance += cycle.saturating_sub(self.stats.last_cycle);
        }
        self.stats.last_cycle = cycle;
        self.stats.accesses += 1;
    }

    /// Mean cycle distance between consecutive accesses.
    pub fn mean_access_distance(&self) -> Option<f64> {
        self.stats.mean_distance()
    }

    /// Installs a new line: tag, owner and status, all objects valid and clean,
    /// statistics restarted.
    pub(crate) fn install(&mut self, tag: u64, owner: u32, status: LineStatus) {
        self.tag = tag;
        self.owner = owner;
        self.set_status(status);
        self.validate_all();
        self.dirty = 0;
        if self.status == LineStatus::Modified {
            self.mark_all_dirty();
        }
        self.stats = AccessStats::default();
    }

    /// Returns the slot to its post-construction state.
    pub(crate) fn reset(&mut self, tag: u64, status: LineStatus) {
        self.tag = tag;
        self.owner = UNOWNED;
        self.status = status;
        self.clear_objects();
        self.stats = AccessStats::default();
    }

    fn check_pos(&self, pos: usize) {
        assert!(
            pos < self.objects_per_line(),
            "object position {pos} out of range for a {}-object line",
            self.objects_per_line()
        );
    }
}
