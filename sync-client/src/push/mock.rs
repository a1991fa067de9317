//! Mock push connector for testing.
//!
//! Every `connect()` creates an in-memory socket the test can push frames
//! into or drop. Connect attempts are timestamped with the tokio clock so
//! backoff delays can be asserted under a paused runtime.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::{PushConnector, PushError, PushSocket, SocketEvent, SOCKET_QUEUE};

/// Mock push connector.
#[derive(Debug, Default, Clone)]
pub struct MockConnector {
    inner: Arc<Mutex<MockConnectorInner>>,
}

#[derive(Debug, Default)]
struct MockConnectorInner {
    attempts: Vec<(Instant, String)>,
    connect_failures: VecDeque<String>,
    sockets: Vec<MockSocket>,
}

#[derive(Debug)]
struct MockSocket {
    events: Option<mpsc::Sender<SocketEvent>>,
    closed_locally: bool,
}

impl MockConnector {
    /// Create a new mock connector.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockConnectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cause the next `connect()` to fail. Calls queue up.
    pub fn fail_next_connect(&self, error: &str) {
        self.lock().connect_failures.push_back(error.to_string());
    }

    /// Deliver a text frame on the newest socket.
    ///
    /// Returns `false` when no socket is open.
    pub fn push_text(&self, text: &str) -> bool {
        let inner = self.lock();
        match inner.sockets.last().and_then(|s| s.events.as_ref()) {
            Some(events) => events.try_send(SocketEvent::Text(text.to_string())).is_ok(),
            None => false,
        }
    }

    /// Close the newest socket from the controller side.
    pub fn drop_connection(&self, reason: &str) {
        let mut inner = self.lock();
        if let Some(events) = inner.sockets.last_mut().and_then(|s| s.events.take()) {
            let _ = events.try_send(SocketEvent::Closed {
                reason: reason.to_string(),
            });
        }
    }

    /// Number of connect attempts, failed ones included.
    pub fn connect_count(&self) -> usize {
        self.lock().attempts.len()
    }

    /// When each connect attempt happened.
    pub fn connect_times(&self) -> Vec<Instant> {
        self.lock().attempts.iter().map(|(t, _)| *t).collect()
    }

    /// URL of the most recent attempt.
    pub fn last_url(&self) -> Option<String> {
        self.lock().attempts.last().map(|(_, url)| url.clone())
    }

    /// Sockets opened and neither closed locally nor dropped.
    pub fn open_count(&self) -> usize {
        self.lock()
            .sockets
            .iter()
            .filter(|s| s.events.is_some() && !s.closed_locally)
            .count()
    }

    /// Sockets the client closed.
    pub fn closed_count(&self) -> usize {
        self.lock().sockets.iter().filter(|s| s.closed_locally).count()
    }
}

#[async_trait]
impl PushConnector for MockConnector {
    async fn connect(&self, url: &str) -> Result<PushSocket, PushError> {
        let mut inner = self.lock();
        inner.attempts.push((Instant::now(), url.to_string()));

        if let Some(error) = inner.connect_failures.pop_front() {
            return Err(PushError::ConnectionFailed(error));
        }

        let (events, rx) = mpsc::channel(SOCKET_QUEUE);
        let (close_tx, close_rx) = oneshot::channel::<()>();
        let index = inner.sockets.len();
        inner.sockets.push(MockSocket {
            events: Some(events),
            closed_locally: false,
        });
        drop(inner);

        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if close_rx.await.is_ok() {
                let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(socket) = inner.sockets.get_mut(index) {
                    socket.closed_locally = true;
                    socket.events = None;
                }
            }
        });

        Ok(PushSocket::new(rx, close_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_reach_the_socket() {
        let connector = MockConnector::new();
        let socket = connector.connect("ws://kiosk/ws").await.unwrap();
        let (mut events, _closer) = socket.into_parts();

        assert!(connector.push_text("hello"));
        assert_eq!(events.recv().await, Some(SocketEvent::Text("hello".into())));
        assert_eq!(connector.last_url().as_deref(), Some("ws://kiosk/ws"));
    }

    #[tokio::test]
    async fn dropped_connection_reports_closed() {
        let connector = MockConnector::new();
        let (mut events, _closer) = connector.connect("ws://k/ws").await.unwrap().into_parts();

        connector.drop_connection("reset");

        assert_eq!(
            events.recv().await,
            Some(SocketEvent::Closed {
                reason: "reset".into()
            })
        );
        assert_eq!(events.recv().await, None);
        assert_eq!(connector.open_count(), 0);
    }

    #[tokio::test]
    async fn local_close_is_recorded() {
        let connector = MockConnector::new();
        let (_events, mut closer) = connector.connect("ws://k/ws").await.unwrap().into_parts();
        assert_eq!(connector.open_count(), 1);

        closer.close();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        assert_eq!(connector.closed_count(), 1);
        assert_eq!(connector.open_count(), 0);
    }

    #[tokio::test]
    async fn forced_connect_failures_queue() {
        let connector = MockConnector::new();
        connector.fail_next_connect("refused");
        connector.fail_next_connect("refused");

        assert!(connector.connect("ws://k/ws").await.is_err());
        assert!(connector.connect("ws://k/ws").await.is_err());
        assert!(connector.connect("ws://k/ws").await.is_ok());
        assert_eq!(connector.connect_count(), 3);
    }
}
