//! Pull-side types: the `/api/status` response and the program catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{NumericField, ProgramId, ProtocolError, SessionId};

/// Path of the full-state pull endpoint.
pub const STATUS_PATH: &str = "/api/status";

/// Session lifecycle state as reported by the controller.
///
/// The controller owns this state machine; the terminal only mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No customer session.
    Idle,
    /// Session open, waiting for funds.
    AwaitingPayment,
    /// Funds available, no program running.
    Ready,
    /// A program is running.
    Active,
    /// A program was paused.
    Paused,
    /// Session finished.
    Completed,
    /// Waiting for the customer to pick a program.
    AwaitingSelection,
}

impl SessionState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::AwaitingPayment => "AWAITING_PAYMENT",
            Self::Ready => "READY",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::AwaitingSelection => "AWAITING_SELECTION",
        }
    }
}

impl FromStr for SessionState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(Self::Idle),
            "AWAITING_PAYMENT" => Ok(Self::AwaitingPayment),
            "READY" => Ok(Self::Ready),
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            "AWAITING_SELECTION" => Ok(Self::AwaitingSelection),
            other => Err(ProtocolError::UnknownSessionState(other.to_string())),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable kiosk program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Catalog identifier.
    pub id: ProgramId,
    /// Display name.
    pub name: String,
    /// Price per second of use, as a decimal.
    pub price_per_second: NumericField,
    /// Optional display icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Program {
    /// Build a catalog entry.
    pub fn new(id: impl Into<String>, name: &str, price_per_second: &str) -> Self {
        Self {
            id: ProgramId::new(id),
            name: name.to_string(),
            price_per_second: NumericField::from(price_per_second),
            icon: None,
        }
    }

    /// The per-second rate, if the price parses as a finite number.
    pub fn rate(&self) -> Option<f64> {
        self.price_per_second.value()
    }
}

/// Response body of `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KioskStatus {
    /// Controller-side kiosk state code.
    #[serde(default)]
    pub kiosk_state: i64,
    /// Current session, if any.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// State of the current session, if any.
    #[serde(default)]
    pub session_state: Option<SessionState>,
    /// Current balance, if a session holds one.
    #[serde(default)]
    pub balance: Option<NumericField>,
    /// Program catalog.
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl KioskStatus {
    /// Decode a status response body.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// The balance as a number, if present and numeric.
    pub fn balance_value(&self) -> Option<f64> {
        self.balance.as_ref().and_then(NumericField::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_JSON: &str = r#"{
        "kiosk_state": 1,
        "session_id": "sess-1",
        "session_state": "AWAITING_SELECTION",
        "balance": 1000,
        "programs": [
            {"id": "1", "name": "Water", "price_per_second": "16.6667", "icon": "droplet"},
            {"id": 2, "name": "Foam", "price_per_second": 25}
        ]
    }"#;

    #[test]
    fn decodes_full_status() {
        let status = KioskStatus::from_json(STATUS_JSON).unwrap();

        assert_eq!(status.kiosk_state, 1);
        assert_eq!(status.session_id, Some(SessionId::new("sess-1")));
        assert_eq!(status.session_state, Some(SessionState::AwaitingSelection));
        assert_eq!(status.balance_value(), Some(1000.0));
        assert_eq!(status.programs.len(), 2);
        assert_eq!(status.programs[0].rate(), Some(16.6667));
        assert_eq!(status.programs[0].icon.as_deref(), Some("droplet"));
        assert_eq!(status.programs[1].id.as_str(), "2");
        assert_eq!(status.programs[1].rate(), Some(25.0));
    }

    #[test]
    fn decodes_empty_controller_state() {
        let status = KioskStatus::from_json(
            r#"{"kiosk_state": 0, "session_id": null, "session_state": null, "balance": null, "programs": []}"#,
        )
        .unwrap();

        assert!(status.session_id.is_none());
        assert!(status.session_state.is_none());
        assert!(status.balance_value().is_none());
    }

    #[test]
    fn missing_fields_default() {
        let status = KioskStatus::from_json("{}").unwrap();
        assert_eq!(status.kiosk_state, 0);
        assert!(status.programs.is_empty());
    }

    #[test]
    fn unknown_session_state_is_rejected() {
        let result = KioskStatus::from_json(r#"{"session_state": "WASHING"}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn session_state_from_str_matches_wire_names() {
        for state in [
            SessionState::Idle,
            SessionState::AwaitingPayment,
            SessionState::Ready,
            SessionState::Active,
            SessionState::Paused,
            SessionState::Completed,
            SessionState::AwaitingSelection,
        ] {
            assert_eq!(state.as_str().parse::<SessionState>().unwrap(), state);
        }
        assert!("active".parse::<SessionState>().is_err());
    }

    #[test]
    fn non_numeric_price_has_no_rate() {
        let program = Program::new("9", "Broken", "free");
        assert_eq!(program.rate(), None);
    }
}
