//! # sync-client
//!
//! Session sync engine for self-service kiosk terminals.
//!
//! The engine keeps one local picture of a kiosk session (balance,
//! program catalog, selection, connection health) consistent with a
//! controller that exposes a REST status endpoint and a WebSocket push
//! channel.
//!
//! ## Features
//!
//! - **Pull as ground truth**: bootstrap, manual refresh and periodic polls
//!   fetch the full status; push messages that cannot be applied safely
//!   trigger a fetch instead
//! - **Resilient push channel**: bounded exponential backoff, then a
//!   cooldown before trying again
//! - **Optimistic actions**: the screen updates before the controller
//!   confirms; failed commands are re-sent with backoff
//! - **Transport abstraction**: [`ControllerApi`] and [`PushConnector`] with
//!   mock implementations for tests
//! - **Pure state machine**: channel lifecycle and reducer live in sync-core
//!
//! ## Example
//!
//! ```ignore
//! use kiosk_sync_client::{EngineConfig, SyncEngine};
//!
//! let config = EngineConfig::new("http://10.0.0.5:8080", "10.0.0.5:8080");
//! let engine = SyncEngine::http(config)?;
//! engine.start().await;
//!
//! let mut notices = engine.subscribe();
//! engine.select_program("2").await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
mod channel;
pub mod config;
mod dispatcher;
mod engine;
mod fetcher;
pub mod push;
mod timer;

pub use api::{ApiError, ControllerApi, HttpApi, MockApi};
pub use config::{ConfigError, EngineConfig};
pub use dispatcher::ActionOutcome;
pub use engine::SyncEngine;
pub use fetcher::FetchOutcome;
pub use push::{
    MockConnector, PushConnector, PushError, PushSocket, SocketCloser, SocketEvent, WsConnector,
};

pub use kiosk_sync_core::{
    ActionKind, ConnectionStatus, DisplayStatus, Notice, NoticeLevel, SessionSnapshot, Violation,
};
