//! Per-property-id serialization:
//! mutations to a single property id are serialized by acquiring this lock
//! before building the document; no order is guaranteed across ids. Shaped
//! after the sharded-mutex `commit_locks: DashMap<BranchId, Mutex<()>>`
//! pattern used elsewhere in this codebase's concurrency layer.

use dashmap::DashMap;
use propdex_core::PropertyId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A lazily-populated table of per-property-id mutexes.
#[derive(Default)]
pub struct PropertyLockTable {
    locks: DashMap<PropertyId, Arc<Mutex<()>>>,
}

impl PropertyLockTable {
    /// An empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the serialization lock for `id`, creating its entry on first use.
    pub async fn lock(&self, id: PropertyId) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        mutex.lock_owned().await
    }

    /// Drop the table entry for `id`, e.g. after the property is deleted.
    /// Safe even if a lock is currently held; the guard keeps its own `Arc`.
    pub fn forget(&self, id: PropertyId) {
        self.locks.remove(&id);
    }
}
