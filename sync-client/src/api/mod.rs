//! Controller REST API abstraction.
//!
//! The engine talks to the controller through [`ControllerApi`]: one pull
//! (`GET /api/status`) and a family of fire-and-confirm commands
//! (`POST /api/actions/*`). [`HttpApi`] is the real client; [`MockApi`]
//! scripts responses for tests.

mod http;
mod mock;

pub use http::HttpApi;
pub use mock::MockApi;

use async_trait::async_trait;
use kiosk_sync_types::{Command, KioskStatus, ProtocolError};
use thiserror::Error;

/// REST API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or its response not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The controller answered with a non-success status.
    #[error("controller returned HTTP {0}")]
    Status(u16),

    /// The status body did not decode.
    #[error("invalid status response: {0}")]
    Protocol(#[from] ProtocolError),

    /// The base URL is unusable.
    #[error("invalid controller url: {0:?}")]
    InvalidUrl(String),
}

/// Controller REST API.
#[async_trait]
pub trait ControllerApi: Send + Sync + 'static {
    /// Pull the full authoritative status.
    async fn status(&self) -> Result<KioskStatus, ApiError>;

    /// Send a command. Success carries no body.
    async fn send(&self, command: &Command) -> Result<(), ApiError>;
}
