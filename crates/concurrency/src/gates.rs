//! Write and search admission gates: bounded counting
//! semaphores with fair (FIFO) admission, so a saturated gate makes callers
//! queue rather than spawn unboundedly.

use propdex_core::limits::{DEFAULT_SEARCH_GATE_CONCURRENCY, DEFAULT_WRITE_GATE_CONCURRENCY};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// The two bounded concurrency gates shared by the whole engine: index
/// mutations and queries never contend with each other's budget.
pub struct Gates {
    write: Arc<Semaphore>,
    search: Arc<Semaphore>,
}

impl Gates {
    /// Gates sized per the default admission-control tunables.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WRITE_GATE_CONCURRENCY, DEFAULT_SEARCH_GATE_CONCURRENCY)
    }

    /// Gates sized explicitly, for tests that want tighter saturation.
    pub fn with_capacity(write_capacity: usize, search_capacity: usize) -> Self {
        Gates {
            write: Arc::new(Semaphore::new(write_capacity)),
            search: Arc::new(Semaphore::new(search_capacity)),
        }
    }

    /// Acquire a write-gate permit, queuing if the gate is saturated.
    pub async fn acquire_write(&self) -> SemaphorePermit<'_> {
        self.write.acquire().await.expect("write gate never closes")
    }

    /// Acquire a search-gate permit, queuing if the gate is saturated.
    pub async fn acquire_search(&self) -> SemaphorePermit<'_> {
        self.search.acquire().await.expect("search gate never closes")
    }

    /// Try to acquire a search-gate permit without waiting; used for the
    /// "abort on rejection" policy when paired with an open circuit breaker.
    pub fn try_acquire_search(&self) -> Option<SemaphorePermit<'_>> {
        self.search.try_acquire().ok()
    }
}

impl Default for Gates {
    fn default() -> Self {
        Self::new()
    }
}
