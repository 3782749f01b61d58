//! Cancellable scheduled work
//!
//! A [`DebounceSlot`] owns at most one pending task. Scheduling new work
//! aborts the previously scheduled task if it is still waiting, so only the
//! last call within the delay window ever runs.
//!
//! Once the delay elapses the work is detached into its own task. Cancelling
//! or rescheduling after that point cannot interrupt it, which keeps
//! in-flight model calls safe from a late cancel.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// One restartable debounce timer
#[derive(Debug)]
pub struct DebounceSlot {
    name: &'static str,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceSlot {
    /// Create a slot that delays scheduled work by `delay`
    ///
    /// # Arguments
    ///
    /// * `name` - Label used in log output
    /// * `delay` - Quiet period required before the work runs
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Configured quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `work`, replacing any work still waiting in this slot
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let name = self.name;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("{} debounce elapsed", name);
            tokio::spawn(work);
        });

        if let Some(previous) = self.lock().replace(handle) {
            if !previous.is_finished() {
                tracing::debug!("{} debounce restarted", self.name);
            }
            previous.abort();
        }
    }

    /// Drop the waiting work, if any
    ///
    /// # Returns
    ///
    /// `true` if work was still waiting and has been cancelled
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                if was_waiting {
                    tracing::debug!("{} debounce cancelled", self.name);
                }
                was_waiting
            }
            None => false,
        }
    }

    /// Whether work is scheduled and its delay has not yet elapsed
    pub fn is_waiting(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }
}
