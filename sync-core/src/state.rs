//! Push channel state machine.
//!
//! Pure and side-effect free: it takes channel events and returns the new
//! state plus a list of actions to execute. Opening sockets and arming
//! timers is the caller's job (sync-client), which keeps every reconnect
//! path testable without a network.
//!
//! A lost socket is retried with the shared backoff (1s, 2s, 4s by
//! default). When those retries are used up the machine raises
//! [`Notice::ConnectionLost`] and waits out a cooldown, after which the
//! counter is cleared and a fresh connection cycle begins.

use std::time::Duration;

use crate::notice::Notice;
use crate::retry::RetryPolicy;
use crate::store::ConnectionStatus;

/// Default wait after reconnects are exhausted.
pub const COOLDOWN: Duration = Duration::from_secs(30);

/// Where the channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// Never started.
    Idle,
    /// A socket is being opened.
    Connecting,
    /// A socket is open.
    Connected,
    /// Waiting for the reconnect timer.
    Reconnecting,
    /// Reconnects exhausted; waiting for the cooldown timer.
    CoolingDown,
    /// Shut down. Terminal.
    Closed,
}

/// Push channel lifecycle, with its own retry counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    phase: ChannelPhase,
    retry: RetryPolicy,
    cooldown: Duration,
}

impl ChannelState {
    /// Create an idle channel.
    pub fn new(retry: RetryPolicy, cooldown: Duration) -> Self {
        Self {
            phase: ChannelPhase::Idle,
            retry,
            cooldown,
        }
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(mut self, event: ChannelEvent) -> (Self, Vec<ChannelAction>) {
        use ChannelPhase::*;

        match (self.phase, event) {
            (Closed, _) => (self, vec![]),

            (_, ChannelEvent::ShutdownRequested) => {
                self.phase = Closed;
                (self, vec![ChannelAction::CancelTimer, ChannelAction::Disconnect])
            }

            // An explicit request re-arms a channel that is not already
            // open or opening, even mid-backoff or mid-cooldown.
            (Idle | Reconnecting | CoolingDown, ChannelEvent::ConnectRequested) => {
                self.retry.reset();
                self.phase = Connecting;
                (self, vec![ChannelAction::CancelTimer, ChannelAction::Connect])
            }

            (Connecting, ChannelEvent::Opened) => {
                self.retry.reset();
                self.phase = Connected;
                (self, vec![])
            }

            (Connected, ChannelEvent::MessageReceived { text }) => {
                self.retry.reset();
                (self, vec![ChannelAction::Deliver { text }])
            }

            (Connecting, ChannelEvent::ConnectFailed { .. })
            | (Connected, ChannelEvent::Disconnected { .. }) => self.schedule_reconnect(),

            (Reconnecting, ChannelEvent::ReconnectTimer) => {
                self.phase = Connecting;
                (self, vec![ChannelAction::Connect])
            }

            (CoolingDown, ChannelEvent::CooldownElapsed) => {
                self.retry.reset();
                self.phase = Connecting;
                (self, vec![ChannelAction::Connect])
            }

            // Stale timers, late frames from a replaced socket and
            // duplicate requests.
            _ => (self, vec![]),
        }
    }

    fn schedule_reconnect(mut self) -> (Self, Vec<ChannelAction>) {
        match self.retry.next_delay() {
            Some(delay) => {
                self.phase = ChannelPhase::Reconnecting;
                (
                    self,
                    vec![
                        ChannelAction::Disconnect,
                        ChannelAction::StartReconnectTimer { delay },
                    ],
                )
            }
            None => {
                self.phase = ChannelPhase::CoolingDown;
                let delay = self.cooldown;
                (
                    self,
                    vec![
                        ChannelAction::Disconnect,
                        ChannelAction::Notify(Notice::ConnectionLost),
                        ChannelAction::StartCooldown { delay },
                    ],
                )
            }
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    /// Status as shown to the user.
    pub fn status(&self) -> ConnectionStatus {
        match self.phase {
            ChannelPhase::Connecting => ConnectionStatus::Connecting,
            ChannelPhase::Connected => ConnectionStatus::Connected,
            _ => ConnectionStatus::Disconnected,
        }
    }

    /// Reconnect attempts consumed in the current cycle.
    pub fn retry_count(&self) -> u32 {
        self.retry.attempt()
    }

    /// Whether the channel was ever asked to connect.
    pub fn is_started(&self) -> bool {
        self.phase != ChannelPhase::Idle
    }

    /// Whether the channel has been shut down.
    pub fn is_closed(&self) -> bool {
        self.phase == ChannelPhase::Closed
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), COOLDOWN)
    }
}

/// Events that can occur in the channel lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Open (or re-open) the channel.
    ConnectRequested,
    /// The socket opened.
    Opened,
    /// Opening the socket failed.
    ConnectFailed {
        /// Error message.
        error: String,
    },
    /// A text frame arrived.
    MessageReceived {
        /// Raw frame.
        text: String,
    },
    /// An open socket closed or errored.
    Disconnected {
        /// Reason for the close.
        reason: String,
    },
    /// The reconnect timer fired.
    ReconnectTimer,
    /// The cooldown timer fired.
    CooldownElapsed,
    /// Tear down for good.
    ShutdownRequested,
}

/// Instructions for the channel executor.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    /// Open a socket, replacing any existing one.
    Connect,
    /// Close the current socket, if any.
    Disconnect,
    /// Hand a frame to the reducer.
    Deliver {
        /// Raw frame.
        text: String,
    },
    /// Arm the reconnect timer.
    StartReconnectTimer {
        /// Delay before reconnecting.
        delay: Duration,
    },
    /// Arm the cooldown timer.
    StartCooldown {
        /// Cooldown length.
        delay: Duration,
    },
    /// Cancel whichever timer is armed.
    CancelTimer,
    /// Show a notice.
    Notify(Notice),
}
