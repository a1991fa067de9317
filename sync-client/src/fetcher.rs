//! Status fetcher: pulls the authoritative status into the store.
//!
//! This is the ground truth. Bootstrap, manual refresh, periodic polling
//! and every resync the push reducer asks for all come through
//! [`Inner::fetch_status`]. A failed fetch leaves the store untouched and
//! retries with backoff until the policy runs out, then raises
//! [`Notice::StatusLost`] once and waits for a manual refresh (or the
//! next poll) to try again.

use kiosk_sync_core::{ActionKind, Notice, RetryPolicy};
use kiosk_sync_types::{Command, KioskStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::api::{ApiError, ControllerApi};
use crate::engine::Inner;
use crate::push::PushConnector;
use crate::timer::TimerSlot;

/// Result of a status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The status was written into the store.
    Applied,
    /// The fetch failed; another attempt is scheduled.
    RetryScheduled {
        /// Retry number (1-based).
        attempt: u32,
        /// Delay before it.
        delay: Duration,
    },
    /// The fetch failed and no retry is left.
    Exhausted,
    /// The engine was shut down; the result was dropped.
    Discarded,
}

/// Why a fetch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchTrigger {
    Bootstrap,
    Manual,
    Retry,
    Resync,
    Poll,
}

/// Fetcher bookkeeping.
#[derive(Debug)]
pub(crate) struct FetchState {
    retry: RetryPolicy,
    timer: TimerSlot,
    // StatusLost was raised for the current exhaustion.
    lost: bool,
    session_requested: bool,
}

impl FetchState {
    pub(crate) fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            timer: TimerSlot::default(),
            lost: false,
            session_requested: false,
        }
    }

    fn reset(&mut self) {
        self.retry.reset();
        self.timer.cancel();
        self.lost = false;
    }

    pub(crate) fn cancel_retry(&mut self) {
        self.timer.cancel();
    }
}

impl<A: ControllerApi, C: PushConnector> Inner<A, C> {
    /// Pull status and apply it.
    pub(crate) async fn fetch_status(self: &Arc<Self>, trigger: FetchTrigger) -> FetchOutcome {
        if !self.is_live() {
            return FetchOutcome::Discarded;
        }
        if trigger == FetchTrigger::Manual {
            self.fetcher.lock().await.reset();
        }

        tracing::debug!("Fetching status ({:?})", trigger);
        self.store.lock().await.begin_request();
        let result = self.api.status().await;

        if !self.is_live() {
            tracing::debug!("Discarding status that arrived after shutdown");
            return FetchOutcome::Discarded;
        }
        self.store.lock().await.end_request();

        match result {
            Ok(status) => self.apply_fetched(status).await,
            Err(error) => self.fetch_failed(error).await,
        }
    }

    async fn apply_fetched(self: &Arc<Self>, status: KioskStatus) -> FetchOutcome {
        let first = {
            let mut store = self.store.lock().await;
            let first = !store.is_initialized();
            if store.apply_status(&status) {
                tracing::info!("Session completed; local session reset");
            }
            first
        };

        let start_session = {
            let mut fetcher = self.fetcher.lock().await;
            fetcher.reset();
            let needed = first && status.session_id.is_none() && !fetcher.session_requested;
            fetcher.session_requested |= needed;
            needed
        };
        if start_session {
            tracing::info!("Controller has no session; starting one");
            self.spawn_start_session();
        }

        self.ensure_channel().await;
        FetchOutcome::Applied
    }

    async fn fetch_failed(self: &Arc<Self>, error: ApiError) -> FetchOutcome {
        tracing::warn!("Status fetch failed: {}", error);

        if !self.store.lock().await.is_initialized() {
            self.notify(Notice::StatusUnavailable);
        }

        let mut fetcher = self.fetcher.lock().await;
        match fetcher.retry.next_delay() {
            Some(delay) => {
                let attempt = fetcher.retry.attempt();
                tracing::info!("Status retry {} in {:?}", attempt, delay);
                self.schedule_fetch_retry(&mut fetcher.timer, delay);
                FetchOutcome::RetryScheduled { attempt, delay }
            }
            None => {
                let first_exhaustion = !fetcher.lost;
                fetcher.lost = true;
                drop(fetcher);
                if first_exhaustion {
                    self.notify(Notice::StatusLost);
                }
                FetchOutcome::Exhausted
            }
        }
    }

    fn schedule_fetch_retry(self: &Arc<Self>, timer: &mut TimerSlot, delay: Duration) {
        let inner = Arc::clone(self);
        timer.schedule(delay, move |generation| async move {
            if !inner.fetcher.lock().await.timer.claim(generation) || !inner.is_live() {
                return;
            }
            inner.fetch_status(FetchTrigger::Retry).await;
        });
    }

    /// Run a fetch in the background.
    pub(crate) fn spawn_fetch(self: &Arc<Self>, trigger: FetchTrigger) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.fetch_status(trigger).await;
        });
    }

    fn spawn_start_session(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner
                .run_action(ActionKind::StartSession, Command::StartSession)
                .await;
        });
    }

    /// Start the periodic resync task, replacing any previous one.
    pub(crate) async fn start_polling(self: &Arc<Self>) {
        let Some(period) = self.config.poll_interval() else {
            tracing::debug!("Periodic status polling disabled");
            return;
        };

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; bootstrap already fetched.
            timer.tick().await;
            loop {
                timer.tick().await;
                if !inner.is_live() {
                    break;
                }
                inner.fetch_status(FetchTrigger::Poll).await;
            }
        });

        if let Some(previous) = self.poll.lock().await.replace(handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_exhaustion() {
        let mut state = FetchState::new(RetryPolicy::new(1, Duration::from_millis(10)));
        assert!(state.retry.next_delay().is_some());
        assert!(state.retry.next_delay().is_none());
        state.lost = true;

        state.reset();

        assert_eq!(state.retry.attempt(), 0);
        assert!(!state.lost);
        assert!(!state.timer.is_armed());
    }
}
