//! Registry of in-flight background tasks, drained on shutdown.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Default)]
pub struct TaskRegistry {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spawned task and discard the handles of tasks that have
    /// already completed, so the registry doesn't grow unbounded over a
    /// long-running process.
    pub async fn register(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Wait for all registered tasks to finish, aborting any still running
    /// after `grace`. Logs (rather than propagates) any task that returned
    /// a `JoinError`, since a cancelled or panicked background task must
    /// not take the shutdown sequence down with it.
    pub async fn drain(&self, grace: Duration) {
        let handles = {
            let mut guard = self.handles.lock().await;
            std::mem::take(&mut *guard)
        };

        if handles.is_empty() {
            return;
        }

        let joined = tokio::time::timeout(grace, futures_util::future::join_all(handles)).await;

        match joined {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        if e.is_cancelled() {
                            continue;
                        }
                        warn!(error = %e, "background task panicked during shutdown drain");
                    }
                }
            }
            Err(_) => {
                warn!("shutdown drain grace period elapsed with tasks still running");
            }
        }
    }
}
