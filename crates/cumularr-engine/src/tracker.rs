//! Tracking for spawned import and seed watchers.
//!
//! Watchers are long-lived and must not be fire-and-forget: their
//! completion has to be observed so panics and terminal errors surface in
//! the log, and the tracking structure has to stay bounded by the number of
//! watchers actually alive. Completed entries are swept before every
//! insert, which keeps memory at O(alive watchers) without a dedicated
//! reaper task.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinSet;
use tracing::{debug, error};

/// Supervised set of spawned watcher tasks.
#[derive(Debug, Default)]
pub struct WatcherPool {
    tasks: Mutex<JoinSet<anyhow::Result<()>>>,
}

impl WatcherPool {
    /// Construct an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a watcher, sweeping completed entries first.
    pub fn spawn<F>(&self, label: &'static str, watcher: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut tasks = self.lock();
        Self::sweep(&mut tasks);
        tasks.spawn(watcher);
        debug!(label, alive = tasks.len(), "watcher spawned");
    }

    /// Number of watchers not yet known to have completed.
    #[must_use]
    pub fn alive(&self) -> usize {
        let mut tasks = self.lock();
        Self::sweep(&mut tasks);
        tasks.len()
    }

    /// Await every remaining watcher, absorbing results.
    pub async fn drain(&self) {
        let mut tasks = {
            let mut guard = self.lock();
            std::mem::take(&mut *guard)
        };
        while let Some(result) = tasks.join_next().await {
            Self::absorb(result);
        }
    }

    fn sweep(tasks: &mut JoinSet<anyhow::Result<()>>) {
        while let Some(result) = tasks.try_join_next() {
            Self::absorb(result);
        }
    }

    fn absorb(result: Result<anyhow::Result<()>, tokio::task::JoinError>) {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(error = %err, "watcher terminated with error"),
            Err(join) => error!(error = %join, "watcher task failed to join"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<anyhow::Result<()>>> {
        match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("watcher pool mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}
