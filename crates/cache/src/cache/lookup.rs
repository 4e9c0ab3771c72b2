//! Lookup, warm-up sampling, fills and eviction.

use rand::Rng;
use tracing::{debug, trace};

use super::Cache;
use super::line::LineState;
use super::policies::WayMask;
use crate::coherence::CoherenceRegistry;
use crate::common::{CLEARED_TAG, LineStatus, UNOWNED};

impl<R: CoherenceRegistry, D: Clone + Default> Cache<R, D> {
    /// Looks up `tag` in set `index`, sampling a warm line on a miss.
    ///
    /// Equivalent to [`get_line_state_with`](Self::get_line_state_with) with
    /// no warm owner and probing disabled.
    pub fn get_line_state(&mut self, index: usize, tag: u64) -> Option<&mut LineState> {
        self.get_line_state_with(index, tag, UNOWNED, false)
    }

    /// Looks up `tag` in set `index`.
    ///
    /// A live tag match wins; failing that, the `Reserved` tag match if it is
    /// the only one. `Warm` slots never match, so a line re-marked `Warm`
    /// through [`set_line_status`](Self::set_line_status) stops hitting. On a
    /// true miss with `probe == false` and no invalidated copy of the tag in the
    /// set, a `Warm` slot may be sampled: with probability `warm_percent`, and
    /// only if no sibling cache holds the line, it is filled as owned by
    /// `warm_owner` and returned. Otherwise the slot is marked cold (tagged,
    /// `Invalid`) and the lookup misses.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or two ways hold `tag` live.
    pub fn get_line_state_with(
        &mut self,
        index: usize,
        tag: u64,
        warm_owner: u32,
        probe: bool,
    ) -> Option<&mut LineState> {
        let way = self.find_way(index, tag, warm_owner, probe)?;
        Some(&mut self.lines[index * self.ways + way])
    }

    fn find_way(&mut self, index: usize, tag: u64, warm_owner: u32, probe: bool) -> Option<usize> {
        let mut hit = None;
        let mut reserved = None;
        let mut reserved_matches = 0;
        let mut invalid_match = false;

        for line in self.set_lines(index) {
            if line.tag() != tag {
                continue;
            }
            match line.status() {
                LineStatus::Invalid => invalid_match = true,
                LineStatus::Warm => {}
                LineStatus::Reserved => {
                    reserved_matches += 1;
                    reserved = Some(line.way());
                }
                _ => {
                    if let Some(first) = hit {
                        panic!(
                            "set {index} ways {first} and {} both hold tag {tag:#x}",
                            line.way()
                        );
                    }
                    hit = Some(line.way());
                }
            }
        }

        if hit.is_some() {
            return hit;
        }
        if reserved_matches == 1 {
            return reserved;
        }
        if probe || invalid_match {
            return None;
        }
        self.sample_warm(index, tag, warm_owner)
    }

    fn warm_ways(&self, index: usize) -> WayMask {
        self.set_lines(index)
            .iter()
            .filter(|line| line.status() == LineStatus::Warm)
            .fold(0, |mask, line| mask | (1 << line.way()))
    }

    /// Decides whether a miss on set `index` turns into a warm hit.
    fn sample_warm(&mut self, index: usize, tag: u64, warm_owner: u32) -> Option<usize> {
        let mut candidates = self.warm_ways(index);
        if candidates == 0 {
            return None;
        }
        for _ in 0..self.rng.random_range(0..candidates.count_ones()) {
            candidates &= candidates - 1;
        }
        let way = candidates.trailing_zeros() as usize;

        let draw = self.rng.random_range(0..100u32);
        let warm = draw < self.warm_percent
            && !self.registry.held_elsewhere(&self.level, self.owner, index, tag);

        let slot = index * self.ways + way;
        if warm {
            let status = self.warmed_status;
            self.lines[slot].install(tag, warm_owner, status);
            self.registry.set_status(&self.level, self.owner, index, tag, status);
            if let Some(sink) = &self.sink {
                sink.on_fill(index, way, tag, status);
            }
            trace!(level = %self.level, index, way, tag, %status, "warm sample hit");
            Some(way)
        } else {
            let line = &mut self.lines[slot];
            line.set_tag(tag);
            line.set_status(LineStatus::Invalid);
            trace!(level = %self.level, index, way, tag, draw, "warm sample cold");
            None
        }
    }

    /// Force-populates `tag` in set `index` on behalf of the warm-up manager.
    ///
    /// If a sibling cache already holds the line live, nothing changes and
    /// the current MRU way is returned. If the tag is already present (live or
    /// reserved) its way is returned. Otherwise a victim is chosen (`repl_way`,
    /// or the replacement policy preferring invalid ways), evicted, filled with
    /// `status` owned by `warm_owner`, reported to the registry and made MRU.
    ///
    /// # Returns
    ///
    /// The way holding, or standing in for, the line.
    pub fn warm_up_fill(
        &mut self,
        index: usize,
        tag: u64,
        repl_way: Option<usize>,
        status: LineStatus,
        warm_owner: u32,
    ) -> usize {
        self.check_index(index);
        if self.registry.held_elsewhere(&self.level, self.owner, index, tag) {
            debug!(level = %self.level, index, tag, "warm-up fill skipped: line live in a sibling");
            return self.policy.mru_way(index);
        }
        if let Some(way) = self.find_way(index, tag, warm_owner, true) {
            return way;
        }

        let way = match repl_way {
            Some(way) => {
                self.check_way(way);
                way
            }
            None => self.victim_way(index, true),
        };
        self.evict(index, way);

        self.lines[index * self.ways + way].install(tag, warm_owner, status);
        self.registry.set_status(&self.level, self.owner, index, tag, status);
        if let Some(sink) = &self.sink {
            sink.on_fill(index, way, tag, status);
        }
        self.policy.make_mru(index, way);
        debug!(level = %self.level, index, way, tag, %status, "warm-up fill");
        way
    }

    /// Chooses the way to replace in set `index`.
    ///
    /// With `invalid_first`, the first `Invalid` way is taken outright.
    /// Otherwise, and when no way is invalid, `Reserved` and `Perfect` ways
    /// are masked off and the replacement policy decides.
    ///
    /// # Panics
    ///
    /// Panics if every way is `Reserved` or `Perfect`.
    pub fn victim_way(&mut self, index: usize, invalid_first: bool) -> usize {
        let set = self.set_lines(index);
        if invalid_first {
            if let Some(line) = set.iter().find(|l| l.status() == LineStatus::Invalid) {
                return line.way();
            }
        }
        let excluded = set
            .iter()
            .filter(|l| matches!(l.status(), LineStatus::Reserved | LineStatus::Perfect))
            .fold(0, |mask: WayMask, l| mask | (1 << l.way()));
        self.policy.get_victim(index, excluded)
    }

    /// Line chosen by [`victim_way`](Self::victim_way).
    pub fn get_victim_state(&mut self, index: usize, invalid_first: bool) -> &mut LineState {
        let way = self.victim_way(index, invalid_first);
        &mut self.lines[index * self.ways + way]
    }

    /// Reports the current occupant of `(index, way)` as gone.
    fn evict(&mut self, index: usize, way: usize) {
        let line = &self.lines[index * self.ways + way];
        let (old_tag, old_status) = (line.tag(), line.status());
        if matches!(old_status, LineStatus::Invalid | LineStatus::Warm) {
            return;
        }
        self.registry
            .set_status(&self.level, self.owner, index, old_tag, LineStatus::Invalid);
        if let Some(sink) = &self.sink {
            sink.on_evict(index, way, old_tag);
        }
        trace!(level = %self.level, index, way, old_tag, %old_status, "evicted");
    }

    /// Empties every slot except `Perfect` ones.
    ///
    /// Occupied lines are reported `Invalid` to the registry first. Slots get
    /// the cleared-line tag and return to their construction status, so warm
    /// sampling starts over when it is enabled.
    pub fn clear_all_lines(&mut self) {
        for index in 0..self.lines_per_way {
            for way in 0..self.ways {
                if self.lines[index * self.ways + way].status() == LineStatus::Perfect {
                    continue;
                }
                self.evict(index, way);
                let initial = self.initial_status;
                self.lines[index * self.ways + way].reset(CLEARED_TAG, initial);
            }
        }
        debug!(level = %self.level, owner = self.owner, "cleared all lines");
    }
}
