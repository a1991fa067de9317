//! Push socket abstraction.
//!
//! A [`PushConnector`] opens one socket per call. The socket is handed
//! back as a [`PushSocket`]: a stream of [`SocketEvent`]s plus a
//! [`SocketCloser`]. The channel keeps the closer and feeds the events to
//! its state machine, so the connector never needs to know about
//! reconnect policy.

mod mock;
mod ws;

pub use mock::MockConnector;
pub use ws::WsConnector;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Capacity of a socket's event queue.
pub const SOCKET_QUEUE: usize = 64;

/// Push connection errors.
#[derive(Debug, Error)]
pub enum PushError {
    /// The socket could not be opened.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL is unusable.
    #[error("invalid push url: {0:?}")]
    InvalidUrl(String),
}

/// Something that happened on an open socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A text frame.
    Text(String),
    /// The socket closed or errored. Always the last event.
    Closed {
        /// Why.
        reason: String,
    },
}

/// Closes a socket. Closing twice, or dropping after closing, is a no-op.
#[derive(Debug)]
pub struct SocketCloser(Option<oneshot::Sender<()>>);

impl SocketCloser {
    /// Wrap the close signal of a socket task.
    pub fn new(signal: oneshot::Sender<()>) -> Self {
        Self(Some(signal))
    }

    /// Ask the socket to close.
    pub fn close(&mut self) {
        if let Some(signal) = self.0.take() {
            let _ = signal.send(());
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.0.is_none()
    }
}

impl Drop for SocketCloser {
    fn drop(&mut self) {
        self.close();
    }
}

/// An open push socket.
#[derive(Debug)]
pub struct PushSocket {
    events: mpsc::Receiver<SocketEvent>,
    closer: SocketCloser,
}

impl PushSocket {
    /// Assemble a socket from its event queue and close signal.
    pub fn new(events: mpsc::Receiver<SocketEvent>, close: oneshot::Sender<()>) -> Self {
        Self {
            events,
            closer: SocketCloser::new(close),
        }
    }

    /// Split into the event stream and the closer.
    pub fn into_parts(self) -> (mpsc::Receiver<SocketEvent>, SocketCloser) {
        (self.events, self.closer)
    }
}

/// Opens push sockets.
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
    /// Open a socket to `url`.
    async fn connect(&self, url: &str) -> Result<PushSocket, PushError>;
}
