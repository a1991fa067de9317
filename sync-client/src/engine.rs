//! SyncEngine - the interface a kiosk screen drives.
//!
//! # Architecture
//!
//! The engine owns one [`SessionStore`] and three components that write
//! through it. Each component's logic lives in its own module as an
//! `impl` block on the shared [`Inner`]:
//!
//! ```text
//!                 ┌──────────── fetcher (pull, ground truth)
//! SyncEngine → Inner ─────────── channel (push socket + reducer)
//!                 └──────────── dispatcher (optimistic actions)
//!                        ↓
//!              sync-core (store, reducer, retry, channel state machine)
//! ```
//!
//! Timers and sockets are spawned tasks that hold an `Arc<Inner>`. Every
//! one of them checks the liveness flag before touching state, so nothing
//! mutates the store after [`SyncEngine::shutdown`].
//!
//! # Example
//!
//! ```ignore
//! use kiosk_sync_client::{EngineConfig, SyncEngine};
//!
//! let engine = SyncEngine::http(EngineConfig::from_env()?)?;
//! engine.start().await;
//!
//! engine.select_program("2").await;
//! let snapshot = engine.snapshot().await;
//! println!("{} left", snapshot.time_display);
//!
//! engine.shutdown().await;
//! ```

use kiosk_sync_core::{ActionKind, Notice, NoticeLevel, SessionSnapshot, SessionStore};
use kiosk_sync_types::ProgramId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::api::{ApiError, ControllerApi, HttpApi};
use crate::channel::ChannelRuntime;
use crate::config::EngineConfig;
use crate::dispatcher::{ActionOutcome, ActionSlot};
use crate::fetcher::{FetchOutcome, FetchState, FetchTrigger};
use crate::push::{PushConnector, WsConnector};

/// Capacity of the notice broadcast.
const NOTICE_CAPACITY: usize = 64;

/// State shared by the engine and its background tasks.
pub(crate) struct Inner<A, C> {
    pub(crate) config: EngineConfig,
    pub(crate) api: A,
    pub(crate) connector: C,
    pub(crate) store: Mutex<SessionStore>,
    pub(crate) fetcher: Mutex<FetchState>,
    pub(crate) channel: Mutex<ChannelRuntime>,
    pub(crate) actions: Mutex<HashMap<ActionKind, ActionSlot>>,
    pub(crate) poll: Mutex<Option<JoinHandle<()>>>,
    notices: broadcast::Sender<Notice>,
    disposed: AtomicBool,
}

impl<A: ControllerApi, C: PushConnector> Inner<A, C> {
    fn new(config: EngineConfig, api: A, connector: C) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            store: Mutex::new(SessionStore::new(&config.currency)),
            fetcher: Mutex::new(FetchState::new(config.retry_policy())),
            channel: Mutex::new(ChannelRuntime::new(&config)),
            actions: Mutex::new(HashMap::new()),
            poll: Mutex::new(None),
            notices,
            disposed: AtomicBool::new(false),
            config,
            api,
            connector,
        }
    }

    /// Whether the engine has not been shut down.
    pub(crate) fn is_live(&self) -> bool {
        !self.disposed.load(Ordering::SeqCst)
    }

    /// Log and broadcast a notice. Silent after shutdown.
    pub(crate) fn notify(&self, notice: Notice) {
        if !self.is_live() {
            return;
        }
        match notice.level() {
            NoticeLevel::Success => tracing::info!("{}", notice),
            NoticeLevel::Warning => tracing::warn!("{}", notice),
            NoticeLevel::Alert => tracing::error!("{}", notice),
        }
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    /// Mark disposed and tear down. Later calls do nothing.
    pub(crate) async fn shutdown(self: &Arc<Self>) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.teardown().await;
    }

    async fn teardown(self: &Arc<Self>) {
        tracing::info!("Shutting down sync engine");

        if let Some(poll) = self.poll.lock().await.take() {
            poll.abort();
        }
        self.fetcher.lock().await.cancel_retry();
        for slot in self.actions.lock().await.values_mut() {
            slot.cancel_retry();
        }
        self.shutdown_channel().await;
    }
}

/// The kiosk session sync engine.
///
/// Generic over the controller API and push connector so tests can run it
/// against [`MockApi`](crate::MockApi) and
/// [`MockConnector`](crate::MockConnector).
pub struct SyncEngine<A: ControllerApi, C: PushConnector> {
    inner: Arc<Inner<A, C>>,
}

impl SyncEngine<HttpApi, WsConnector> {
    /// Engine talking HTTP and WebSocket to the configured controller.
    pub fn http(config: EngineConfig) -> Result<Self, ApiError> {
        let api = HttpApi::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::new(config, api, WsConnector::new()))
    }
}

impl<A: ControllerApi, C: PushConnector> SyncEngine<A, C> {
    /// Create an engine. Nothing happens until [`start`](Self::start).
    pub fn new(config: EngineConfig, api: A, connector: C) -> Self {
        Self {
            inner: Arc::new(Inner::new(config, api, connector)),
        }
    }

    /// Bootstrap: fetch status, open the push channel, begin periodic polling.
    ///
    /// The push channel opens after the first successful fetch, which may
    /// be a later retry if this one fails.
    pub async fn start(&self) -> FetchOutcome {
        let outcome = self.inner.fetch_status(FetchTrigger::Bootstrap).await;
        self.inner.start_polling().await;
        outcome
    }

    /// Manual resync.
    ///
    /// Resets the fetch retry counter, re-arms a push channel that gave
    /// up or is waiting to reconnect, and fetches immediately.
    pub async fn refresh(&self) -> FetchOutcome {
        if !self.inner.is_live() {
            return FetchOutcome::Discarded;
        }
        self.inner.rearm_channel().await;
        self.inner.fetch_status(FetchTrigger::Manual).await
    }

    /// Select a program. Rejected locally if another program is running.
    pub async fn select_program(&self, program_id: impl Into<ProgramId>) -> ActionOutcome {
        self.inner.select_program(program_id.into()).await
    }

    /// Start the selected program.
    pub async fn start_program(&self) -> ActionOutcome {
        self.inner.start_program().await
    }

    /// Pause the running program.
    pub async fn pause_program(&self) -> ActionOutcome {
        self.inner.pause_program().await
    }

    /// Finish the session. The local session reads as finished immediately.
    pub async fn finish_session(&self) -> ActionOutcome {
        self.inner.finish_session().await
    }

    /// Credit the remaining balance to a loyalty card.
    pub async fn credit_to_loyalty_card(&self, card_id: &str) -> ActionOutcome {
        self.inner.credit_loyalty(card_id).await
    }

    /// Decline the loyalty credit.
    pub async fn decline_credit(&self) -> ActionOutcome {
        self.inner.decline_credit().await
    }

    /// Consistent read of the session, derived fields included.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.store.lock().await.snapshot()
    }

    /// Subscribe to notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Whether the engine is still running.
    pub fn is_live(&self) -> bool {
        self.inner.is_live()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Close the socket, cancel every timer, and discard in-flight results.
    ///
    /// Idempotent.
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }
}

impl<A: ControllerApi, C: PushConnector> Drop for SyncEngine<A, C> {
    fn drop(&mut self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Background tasks hold their own Arc; tear them down if a runtime is around.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = Arc::clone(&self.inner);
            handle.spawn(async move {
                inner.teardown().await;
            });
        }
    }
}
