//! WebSocket push connector (tokio-tungstenite).

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use super::{PushConnector, PushError, PushSocket, SocketEvent, SOCKET_QUEUE};

/// Opens WebSocket connections to the controller.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<PushSocket, PushError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(PushError::InvalidUrl(url.to_string()));
        }

        tracing::info!("Opening push socket {}", url);
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| PushError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = stream.split();
        let (events, rx) = mpsc::channel(SOCKET_QUEUE);
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    _ = &mut close_rx => {
                        let _ = write.send(Message::Close(None)).await;
                        break "closed locally".to_string();
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if events.send(SocketEvent::Text(text.to_string())).await.is_err() {
                                break "receiver dropped".to_string();
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            break frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty())
                                .unwrap_or_else(|| "closed by controller".to_string());
                        }
                        // Ping/Pong are answered by tungstenite; binary frames are not part of the protocol.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream ended".to_string(),
                    }
                }
            };

            tracing::debug!("Push socket loop ended: {}", reason);
            let _ = events.send(SocketEvent::Closed { reason }).await;
        });

        Ok(PushSocket::new(rx, close_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_websocket_url() {
        let result = WsConnector::new().connect("http://kiosk:8000/ws").await;
        assert!(matches!(result, Err(PushError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let result = WsConnector::new().connect("ws://127.0.0.1:9/ws").await;
        assert!(matches!(result, Err(PushError::ConnectionFailed(_))));
    }
}
