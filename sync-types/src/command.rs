//! Commands the terminal sends to the controller.
//!
//! Every command is a `POST` to a fixed path with a small JSON body.
//! There is no response contract beyond success or failure.

use serde_json::json;
use std::fmt;

use crate::ProgramId;

/// A command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new session.
    StartSession,
    /// Select a program (the controller starts it).
    SelectProgram {
        /// Program to select.
        program_id: ProgramId,
    },
    /// Pause the running program.
    Pause,
    /// Finish the session.
    Finish,
    /// Credit the remaining balance to a loyalty card.
    CreditLoyalty {
        /// Loyalty card identifier.
        card_id: String,
    },
    /// Decline crediting the remaining balance.
    DeclineCredit,
}

impl Command {
    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            Self::StartSession => "/api/actions/start_session",
            Self::SelectProgram { .. } => "/api/actions/select_program",
            Self::Pause => "/api/actions/pause",
            Self::Finish => "/api/actions/finish",
            Self::CreditLoyalty { .. } => "/api/actions/credit_loyalty",
            Self::DeclineCredit => "/api/actions/decline_credit",
        }
    }

    /// JSON request body.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::SelectProgram { program_id } => json!({ "program_id": program_id }),
            Self::CreditLoyalty { card_id } => json!({ "card_id": card_id }),
            Self::StartSession | Self::Pause | Self::Finish | Self::DeclineCredit => json!({}),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartSession => f.write_str("start_session"),
            Self::SelectProgram { program_id } => write!(f, "select_program({})", program_id),
            Self::Pause => f.write_str("pause"),
            Self::Finish => f.write_str("finish"),
            Self::CreditLoyalty { .. } => f.write_str("credit_loyalty"),
            Self::DeclineCredit => f.write_str("decline_credit"),
        }
    }
}
