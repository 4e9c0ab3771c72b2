//! Optional notification hook for an external event tracer.
//!
//! A cache with a sink attached reports line installs and evictions as they
//! happen. Nothing in the engine depends on the sink; it exists so tracing or
//! telemetry collaborators can follow tag-array changes without polling.

use crate::common::LineStatus;

/// Receiver of tag-array events.
pub trait CacheEventSink: Send + Sync {
    /// A line was installed by a warm-up fill or a warm sample.
    fn on_fill(&self, index: usize, way: usize, tag: u64, status: LineStatus);

    /// A live line was evicted or cleared.
    fn on_evict(&self, index: usize, way: usize, tag: u64);
}
