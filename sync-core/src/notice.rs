//! User-facing notices and local policy violations.
//!
//! Every failure the engine absorbs is turned into one of these, so the
//! presentation layer never sees a raw transport error.

use kiosk_sync_types::ProgramId;
use std::fmt;
use thiserror::Error;

/// User actions the engine can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Open a session (issued by the engine during bootstrap).
    StartSession,
    /// Select a program.
    SelectProgram,
    /// Start the selected program.
    StartProgram,
    /// Pause the running program.
    PauseProgram,
    /// Finish the session.
    FinishSession,
    /// Credit the balance to a loyalty card.
    CreditLoyalty,
    /// Decline the loyalty credit.
    DeclineCredit,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartSession => "start session",
            Self::SelectProgram => "select program",
            Self::StartProgram => "start program",
            Self::PauseProgram => "pause program",
            Self::FinishSession => "finish session",
            Self::CreditLoyalty => "credit loyalty card",
            Self::DeclineCredit => "decline credit",
        };
        f.write_str(name)
    }
}

/// An action rejected locally, before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// Another program is running; pause or finish it first.
    #[error("program {active} is running; pause or finish it first")]
    ProgramAlreadyActive {
        /// The running program.
        active: ProgramId,
    },
    /// The controller reports a running program this terminal did not select.
    #[error("a program is running; pause or finish it first")]
    ProgramRunning,
    /// Start was requested with nothing selected.
    #[error("select a program first")]
    NoProgramSelected,
    /// The program is not in the catalog.
    #[error("unknown program {0}")]
    UnknownProgram(ProgramId),
    /// Loyalty credit was requested without a card.
    #[error("loyalty card id is empty")]
    MissingCardId,
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    /// Positive feedback ("funds accepted").
    Success,
    /// Transient warning.
    Warning,
    /// Persistent warning: automatic recovery stopped for an operation.
    Alert,
}

/// A notice for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Funds were accepted.
    FundsAdded {
        /// Amount credited.
        amount: f64,
        /// Currency label.
        currency: String,
    },
    /// A status fetch failed; a retry may follow.
    StatusUnavailable,
    /// Status fetch retries are exhausted.
    StatusLost,
    /// Push channel reconnects are exhausted.
    ConnectionLost,
    /// An action failed; a retry may follow.
    ActionFailed {
        /// The failed action.
        action: ActionKind,
    },
    /// Action retries are exhausted.
    ActionAbandoned {
        /// The abandoned action.
        action: ActionKind,
    },
    /// An action was rejected locally.
    PolicyViolation(Violation),
}

impl Notice {
    /// Severity of this notice.
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::FundsAdded { .. } => NoticeLevel::Success,
            Self::StatusUnavailable | Self::ActionFailed { .. } | Self::PolicyViolation(_) => {
                NoticeLevel::Warning
            }
            Self::StatusLost | Self::ConnectionLost | Self::ActionAbandoned { .. } => {
                NoticeLevel::Alert
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FundsAdded { amount, currency } => write!(f, "Added {} {}", amount, currency),
            Self::StatusUnavailable => f.write_str("Could not get kiosk status. Retrying."),
            Self::StatusLost => {
                f.write_str("Could not get kiosk status. Please refresh the page.")
            }
            Self::ConnectionLost => {
                f.write_str("Connection to the server lost. Please refresh the page.")
            }
            Self::ActionFailed { action } => {
                write!(f, "Could not {}. Please try again later.", action)
            }
            Self::ActionAbandoned { action } => {
                write!(f, "Could not {}. Please retry manually.", action)
            }
            Self::PolicyViolation(violation) => write!(f, "{}", violation),
        }
    }
}
