//! Cache line coherence status.
//!
//! The engine does not run a coherence protocol. These states are labels that
//! the surrounding memory system assigns; the tag array only enforces that a
//! `Perfect` line keeps its status forever.

use std::fmt;

use serde::Deserialize;

/// Per-line coherence-like status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LineStatus {
    /// Idealized line that always hits. Sticky: never overwritten.
    Perfect,
    /// Slot eligible for warm-up sampling; holds no real tag yet.
    Warm,
    /// Dirty, exclusively owned.
    Modified,
    /// Clean, exclusively owned.
    Exclusive,
    /// Clean, possibly held by other caches.
    Shared,
    /// Empty slot, or a line that has been invalidated.
    #[default]
    Invalid,
    /// Designated forwarder among sharers.
    Forward,
    /// Locked by an atomic sequence.
    Locked,
    /// Claimed for an in-flight fill; only a weak tag match.
    Reserved,
}

impl LineStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Perfect,
        Self::Warm,
        Self::Modified,
        Self::Exclusive,
        Self::Shared,
        Self::Invalid,
        Self::Forward,
        Self::Locked,
        Self::Reserved,
    ];

    /// True for statuses that make a tag match a real hit.
    ///
    /// `Invalid` and `Reserved` never do. `Warm` slots carry no tag of their own
    /// and are excluded as well.
    #[inline]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Invalid | Self::Reserved | Self::Warm)
    }

    /// True for the two statuses the Cache Manager may erase eagerly.
    #[inline]
    pub const fn is_clearing(self) -> bool {
        matches!(self, Self::Invalid | Self::Reserved)
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Perfect => "Perfect",
            Self::Warm => "Warm",
            Self::Modified => "Modified",
            Self::Exclusive => "Exclusive",
            Self::Shared => "Shared",
            Self::Invalid => "Invalid",
            Self::Forward => "Forward",
            Self::Locked => "Locked",
            Self::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}
