//! Per-resource mutual exclusion for vote mutations.
//!
//! Mutations on the same resource are serialized; mutations on different
//! resources run in parallel. The registry itself is only locked long enough
//! to look up or create an entry, never across I/O.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use votes_shared::types::ResourceId;

/// Dead entries are swept once the registry grows past this many keys.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Default)]
pub struct ResourceLocks {
    entries: Mutex<HashMap<ResourceId, Weak<AsyncMutex<()>>>>,
}

/// Held while a mutation on one resource is in flight.
pub type ResourceGuard = OwnedMutexGuard<()>;

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `resource_id`.
    pub async fn acquire(&self, resource_id: ResourceId) -> ResourceGuard {
        self.lock_for(resource_id).lock_owned().await
    }

    fn lock_for(&self, resource_id: ResourceId) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(lock) = entries.get(&resource_id).and_then(Weak::upgrade) {
            return lock;
        }

        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, lock| lock.strong_count() > 0);
        }

        let lock = Arc::new(AsyncMutex::new(()));
        entries.insert(resource_id, Arc::downgrade(&lock));
        lock
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
