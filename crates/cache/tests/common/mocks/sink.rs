use std::sync::{Mutex, MutexGuard, PoisonError};

use mockall::mock;
use waysim_core::common::LineStatus;
use waysim_core::events::CacheEventSink;

/// Call surface of [`CacheEventSink`] without its thread-safety bounds.
pub trait SinkCalls {
    fn on_fill(&self, index: usize, way: usize, tag: u64, status: LineStatus);
    fn on_evict(&self, index: usize, way: usize, tag: u64);
}

mock! {
    pub Sink {}
    impl SinkCalls for Sink {
        fn on_fill(&self, index: usize, way: usize, tag: u64, status: LineStatus);
        fn on_evict(&self, index: usize, way: usize, tag: u64);
    }
}

/// A thread-safe wrapper handing the mock sink to a cache.
pub struct SyncSink {
    mock: Mutex<MockSink>,
}

impl SyncSink {
    pub fn new(mock: MockSink) -> Self {
        Self {
            mock: Mutex::new(mock),
        }
    }

    /// Locked access to the mock, for checkpoints.
    pub fn mock(&self) -> MutexGuard<'_, MockSink> {
        self.mock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheEventSink for SyncSink {
    fn on_fill(&self, index: usize, way: usize, tag: u64, status: LineStatus) {
        SinkCalls::on_fill(&*self.mock(), index, way, tag, status);
    }

    fn on_evict(&self, index: usize, way: usize, tag: u64) {
        SinkCalls::on_evict(&*self.mock(), index, way, tag);
    }
}
