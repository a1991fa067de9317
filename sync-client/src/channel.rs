//! Push channel executor.
//!
//! Runs the [`ChannelState`] machine from sync-core against a real
//! [`PushConnector`]. The runtime owns exactly one socket closer and one
//! timer slot; a `Connect` action closes the old socket and bumps the
//! socket generation before a new connect is spawned, so events from a
//! replaced socket (late frames, late close, a slow connect) are
//! recognized by their stale generation and dropped.

use kiosk_sync_core::{reduce_text, ChannelAction, ChannelEvent, ChannelState, Effect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::ControllerApi;
use crate::config::EngineConfig;
use crate::engine::Inner;
use crate::fetcher::FetchTrigger;
use crate::push::{PushConnector, PushError, PushSocket, SocketCloser, SocketEvent};
use crate::timer::TimerSlot;

/// Channel bookkeeping: state machine, socket, timer.
#[derive(Debug)]
pub(crate) struct ChannelRuntime {
    state: ChannelState,
    socket: Option<SocketCloser>,
    socket_generation: u64,
    timer: TimerSlot,
}

impl ChannelRuntime {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Self {
            state: ChannelState::new(config.retry_policy(), config.cooldown()),
            socket: None,
            socket_generation: 0,
            timer: TimerSlot::default(),
        }
    }

    fn close_socket(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.close();
        }
        self.socket_generation = self.socket_generation.wrapping_add(1);
    }
}

impl<A: ControllerApi, C: PushConnector> Inner<A, C> {
    /// Connect the channel if it was never started.
    pub(crate) async fn ensure_channel(self: &Arc<Self>) {
        let mut rt = self.channel.lock().await;
        if !rt.state.is_started() {
            self.step_channel(&mut rt, ChannelEvent::ConnectRequested).await;
        }
    }

    /// Reconnect now if the channel is idle, backing off, or cooling down.
    ///
    /// Does nothing before the first successful fetch; that fetch opens it.
    pub(crate) async fn rearm_channel(self: &Arc<Self>) {
        if !self.store.lock().await.is_initialized() {
            return;
        }
        let mut rt = self.channel.lock().await;
        self.step_channel(&mut rt, ChannelEvent::ConnectRequested).await;
    }

    pub(crate) async fn shutdown_channel(self: &Arc<Self>) {
        let mut rt = self.channel.lock().await;
        self.step_channel(&mut rt, ChannelEvent::ShutdownRequested).await;
    }

    async fn step_channel(self: &Arc<Self>, rt: &mut ChannelRuntime, event: ChannelEvent) {
        let (state, actions) = rt.state.clone().on_event(event);
        rt.state = state;

        let mut resync = false;
        for action in actions {
            match action {
                ChannelAction::Connect => {
                    rt.timer.cancel();
                    rt.close_socket();
                    self.spawn_connect(rt.socket_generation);
                }
                ChannelAction::Disconnect => rt.close_socket(),
                ChannelAction::Deliver { text } => resync |= self.deliver(&text).await,
                ChannelAction::StartReconnectTimer { delay } => {
                    tracing::info!(
                        "Push channel reconnect {} in {:?}",
                        rt.state.retry_count(),
                        delay
                    );
                    self.arm_channel_timer(&mut rt.timer, delay, ChannelEvent::ReconnectTimer);
                }
                ChannelAction::StartCooldown { delay } => {
                    tracing::info!("Push channel cooling down for {:?}", delay);
                    self.arm_channel_timer(&mut rt.timer, delay, ChannelEvent::CooldownElapsed);
                }
                ChannelAction::CancelTimer => rt.timer.cancel(),
                ChannelAction::Notify(notice) => self.notify(notice),
            }
        }

        self.store
            .lock()
            .await
            .set_connection(rt.state.status(), rt.state.retry_count());

        if resync && self.is_live() {
            self.spawn_fetch(FetchTrigger::Resync);
        }
    }

    /// Reduce one frame into the store. Returns whether a resync is wanted.
    async fn deliver(&self, text: &str) -> bool {
        let effects = {
            let mut store = self.store.lock().await;
            reduce_text(&mut store, text)
        };

        let mut resync = false;
        for effect in effects {
            match effect {
                Effect::Notify(notice) => self.notify(notice),
                Effect::Discarded { field, raw } => {
                    tracing::warn!("Discarded push field {}: {} is not a number", field, raw);
                }
                Effect::Resync(reason) => {
                    tracing::debug!("Push requested resync: {:?}", reason);
                    resync = true;
                }
            }
        }
        resync
    }

    fn spawn_connect(self: &Arc<Self>, generation: u64) {
        let inner = Arc::clone(self);
        let url = self.config.push_url();
        tokio::spawn(async move {
            let result = inner.connector.connect(&url).await;
            inner.connect_finished(generation, result).await;
        });
    }

    async fn connect_finished(
        self: &Arc<Self>,
        generation: u64,
        result: Result<PushSocket, PushError>,
    ) {
        let mut rt = self.channel.lock().await;
        if rt.socket_generation != generation || rt.state.is_closed() {
            // Superseded while connecting; dropping the socket closes it.
            return;
        }

        match result {
            Ok(socket) => {
                let (events, closer) = socket.into_parts();
                rt.socket = Some(closer);
                self.spawn_reader(generation, events);
                tracing::info!("Push channel connected");
                self.step_channel(&mut rt, ChannelEvent::Opened).await;
            }
            Err(error) => {
                tracing::warn!("Push channel connect failed: {}", error);
                let event = ChannelEvent::ConnectFailed {
                    error: error.to_string(),
                };
                self.step_channel(&mut rt, event).await;
            }
        }
    }

    fn spawn_reader(self: &Arc<Self>, generation: u64, mut events: mpsc::Receiver<SocketEvent>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let (event, last) = match event {
                    SocketEvent::Text(text) => (ChannelEvent::MessageReceived { text }, false),
                    SocketEvent::Closed { reason } => {
                        tracing::warn!("Push channel closed: {}", reason);
                        (ChannelEvent::Disconnected { reason }, true)
                    }
                };
                if !inner.socket_event(generation, event).await || last {
                    return;
                }
            }
            let event = ChannelEvent::Disconnected {
                reason: "socket ended".to_string(),
            };
            inner.socket_event(generation, event).await;
        });
    }

    /// Apply an event from socket `generation`. Returns `false` if stale.
    async fn socket_event(self: &Arc<Self>, generation: u64, event: ChannelEvent) -> bool {
        let mut rt = self.channel.lock().await;
        if rt.socket_generation != generation {
            return false;
        }
        self.step_channel(&mut rt, event).await;
        true
    }

    fn arm_channel_timer(self: &Arc<Self>, timer: &mut TimerSlot, delay: Duration, event: ChannelEvent) {
        let inner = Arc::clone(self);
        timer.schedule(delay, move |generation| async move {
            let mut rt = inner.channel.lock().await;
            if !rt.timer.claim(generation) || !inner.is_live() {
                return;
            }
            inner.step_channel(&mut rt, event).await;
        });
    }
}
