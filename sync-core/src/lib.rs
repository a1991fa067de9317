//! # sync-core
//!
//! Pure logic for kiosk session sync (no I/O, instant tests).
//!
//! This crate holds the session store, the push message reducer, the
//! backoff policy and the push channel state machine. None of it touches
//! the network or a clock.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//!
//! The actual I/O (HTTP, WebSocket, timers) is performed by `sync-client`,
//! which executes the effects and actions these modules return.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod notice;
pub mod projection;
pub mod reducer;
pub mod retry;
pub mod state;
pub mod store;

pub use notice::{ActionKind, Notice, NoticeLevel, Violation};
pub use projection::{format_time, progress, time_remaining, DisplayStatus};
pub use reducer::{reduce, reduce_text, wants_resync, Effect, ResyncReason};
pub use retry::{RetryPolicy, BASE_DELAY, MAX_RETRIES};
pub use state::{ChannelAction, ChannelEvent, ChannelPhase, ChannelState, COOLDOWN};
pub use store::{ConnectionStatus, SessionSnapshot, SessionStore};
