//! Trailing-edge debouncing on the tokio runtime

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs only the last task scheduled within a quiet window
///
/// Every [`Debouncer::schedule`] aborts the previously scheduled task and
/// restarts the timer, so a burst of calls results in a single run.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Quiet window
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` once the window elapses without another call
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            task.await;
        });
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the scheduled task, if any
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }

    /// Whether a task is waiting or running
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the scheduled task to finish
    pub async fn flush(&self) {
        let pending = self.pending.lock().take();
        if let Some(handle) = pending {
            // an aborted task is not an error here
            let _ = handle.await;
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
