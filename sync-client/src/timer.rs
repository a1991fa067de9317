//! Single-occupancy timer slot.
//!
//! Each retrying operation owns one [`TimerSlot`]. Arming the slot aborts
//! whatever was armed before, so an operation never has two pending
//! timers. A fired timer must [`claim`](TimerSlot::claim) its generation
//! under the owner's lock before acting; a timer that was cancelled or
//! replaced while it waited for that lock finds a newer generation and
//! does nothing.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One pending timer, at most.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerSlot {
    /// Arm the slot. `fire` receives the generation to claim with.
    pub(crate) fn schedule<F, Fut>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let task = fire(self.generation);
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Take ownership of a fired timer.
    ///
    /// Returns `false` if the timer was cancelled or replaced.
    pub(crate) fn claim(&mut self, generation: u64) -> bool {
        if self.generation != generation || self.handle.is_none() {
            return false;
        }
        // Detach rather than abort: the claiming task is this handle.
        self.handle = None;
        true
    }

    /// Abort the pending timer, if any.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a timer is pending.
    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
