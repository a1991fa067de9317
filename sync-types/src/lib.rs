//! # sync-types
//!
//! Wire format types for the kiosk controller protocol.
//!
//! This crate provides the foundational types used across all kiosk-sync crates:
//! - [`SessionId`], [`ProgramId`] - Identifiers of controller-owned records
//! - [`KioskStatus`], [`Program`], [`SessionState`] - The `/api/status` pull response
//! - [`PushEnvelope`], [`PushMessage`] - Frames on the push channel
//! - [`Command`] - Action requests sent to the controller
//! - [`ProtocolError`] - Decode errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod envelope;
mod error;
mod ids;
mod numeric;
mod status;

pub use command::Command;
pub use envelope::{BalanceAdded, BalanceUpdate, PushEnvelope, PushMessage, PUSH_PATH};
pub use error::ProtocolError;
pub use ids::{ProgramId, SessionId};
pub use numeric::NumericField;
pub use status::{KioskStatus, Program, SessionState, STATUS_PATH};
