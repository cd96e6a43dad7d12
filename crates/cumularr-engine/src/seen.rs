//! Concurrent membership set of remote-transfer ids already dispatched.
//!
//! The poller inserts ids as it claims transfers and prunes everything the
//! remote side no longer lists, so a transfer that is removed and re-added
//! remotely gets processed again. The startup reconciler inserts ids for
//! transfers that were already imported before this process started.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

/// Mutex-guarded set of dispatched transfer ids.
#[derive(Debug, Default)]
pub struct SeenTransfers {
    inner: Mutex<HashSet<u64>>,
}

impl SeenTransfers {
    /// Construct an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transfer id has already been dispatched.
    #[must_use]
    pub fn contains(&self, transfer_id: u64) -> bool {
        self.lock().contains(&transfer_id)
    }

    /// Record a dispatched transfer id.
    pub fn insert(&self, transfer_id: u64) {
        self.lock().insert(transfer_id);
    }

    /// Drop every id the remote side no longer lists, releasing them for
    /// re-processing if they ever come back.
    pub fn prune(&self, live: &HashSet<u64>) {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|id| live.contains(id));
        let removed = before - guard.len();
        if removed > 0 {
            debug!(removed, retained = guard.len(), "pruned seen transfers");
        }
    }

    /// Number of ids currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no ids are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<u64>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("seen-set mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}
