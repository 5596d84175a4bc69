//! Process-wide graceful shutdown signal.
//!
//! A plain `tokio::sync::Notify` only wakes tasks that are already waiting
//! at the moment `notify_waiters()` fires; a task that subscribes afterward
//! would block forever. `ShutdownSignal` adds a latch so late subscribers
//! observe an already-fired signal immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

struct Inner {
    notify: Notify,
    fired: AtomicBool,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                notify: Notify::new(),
                fired: AtomicBool::new(false),
            }),
        }
    }

    /// Fire the signal. Idempotent: calling this more than once has no
    /// additional effect.
    pub fn signal(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_signalled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Resolves immediately if the signal has already fired; otherwise
    /// waits for the next `signal()` call.
    pub async fn notified(&self) {
        if self.is_signalled() {
            return;
        }
        let notified = self.inner.notify.notified();
        if self.is_signalled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_observes_already_fired_signal() {
        let signal = ShutdownSignal::new();
        signal.signal();
        tokio::time::timeout(Duration::from_millis(50), signal.notified())
            .await
            .expect("late subscriber must not block");
    }

    #[tokio::test]
    async fn early_subscriber_wakes_on_signal() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move {
            waiter.notified().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.signal();
        tokio::time::timeout(Duration::from_millis(50), handle)
            .await
            .expect("waiter must wake")
            .expect("task must not panic");
    }
}
