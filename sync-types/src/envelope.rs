//! Push envelope - the wire format of messages on the push channel.
//!
//! Every frame is a JSON object `{ "t": <type>, "p": <payload> }`. The
//! loosely-typed envelope is decoded once, at the edge, into
//! [`PushMessage`]. Types this crate does not know land in
//! [`PushMessage::Unknown`] rather than being coerced into a known one.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{NumericField, ProtocolError};

/// Path of the push socket, relative to the push base address.
pub const PUSH_PATH: &str = "/ws";

/// Raw push frame as sent by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Message type discriminator.
    pub t: String,
    /// Type-specific payload.
    #[serde(default)]
    pub p: serde_json::Value,
}

impl PushEnvelope {
    /// Build an envelope.
    pub fn new(t: &str, p: serde_json::Value) -> Self {
        Self { t: t.to_string(), p }
    }

    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Malformed)
    }
}

/// Payload of `balance_added`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAdded {
    /// Amount credited to the session.
    pub amount: NumericField,
}

/// Payload of `balance_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// New absolute balance.
    pub balance: NumericField,
    /// Session state at the time of the update, as a wire name.
    #[serde(default)]
    pub session_state: Option<String>,
}

/// A decoded push message.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// Funds were accepted.
    BalanceAdded(BalanceAdded),
    /// The balance changed to an absolute value.
    BalanceUpdate(BalanceUpdate),
    /// A program was selected on the controller.
    ProgramSelected,
    /// A program was started.
    ProgramStarted,
    /// A program was paused.
    ProgramPaused,
    /// The session ended.
    SessionFinished,
    /// A type this terminal does not understand.
    Unknown {
        /// The raw `t` discriminator.
        kind: String,
    },
}

impl PushMessage {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: PushEnvelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
        Self::from_envelope(envelope)
    }

    /// Interpret an already-parsed envelope.
    pub fn from_envelope(envelope: PushEnvelope) -> Result<Self, ProtocolError> {
        let message = match envelope.t.as_str() {
            "balance_added" => Self::BalanceAdded(payload(&envelope)?),
            "balance_update" => Self::BalanceUpdate(payload(&envelope)?),
            "program_selected" => Self::ProgramSelected,
            "program_started" => Self::ProgramStarted,
            "program_paused" => Self::ProgramPaused,
            "session_finished" => Self::SessionFinished,
            _ => Self::Unknown { kind: envelope.t },
        };
        Ok(message)
    }

    /// The wire discriminator of this message.
    pub fn kind(&self) -> &str {
        match self {
            Self::BalanceAdded(_) => "balance_added",
            Self::BalanceUpdate(_) => "balance_update",
            Self::ProgramSelected => "program_selected",
            Self::ProgramStarted => "program_started",
            Self::ProgramPaused => "program_paused",
            Self::SessionFinished => "session_finished",
            Self::Unknown { kind } => kind,
        }
    }
}

fn payload<T: DeserializeOwned>(envelope: &PushEnvelope) -> Result<T, ProtocolError> {
    serde_json::from_value(envelope.p.clone()).map_err(|source| ProtocolError::InvalidPayload {
        kind: envelope.t.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_balance_added() {
        let msg = PushMessage::decode(r#"{"t":"balance_added","p":{"amount":"300","balance_state":"READY"}}"#)
            .unwrap();

        match msg {
            PushMessage::BalanceAdded(added) => assert_eq!(added.amount.value(), Some(300.0)),
            other => panic!("Expected BalanceAdded, got {:?}", other),
        }
    }

    #[test]
    fn decodes_balance_update_with_state() {
        let msg = PushMessage::decode(
            r#"{"t":"balance_update","p":{"balance":"500","session_state":"ACTIVE"}}"#,
        )
        .unwrap();

        match msg {
            PushMessage::BalanceUpdate(update) => {
                assert_eq!(update.balance.value(), Some(500.0));
                assert_eq!(update.session_state.as_deref(), Some("ACTIVE"));
            }
            other => panic!("Expected BalanceUpdate, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_amount_still_decodes() {
        // The reducer decides what to do with a bad number; decoding keeps it.
        let msg = PushMessage::decode(r#"{"t":"balance_added","p":{"amount":"lots"}}"#).unwrap();
        match msg {
            PushMessage::BalanceAdded(added) => assert_eq!(added.amount.value(), None),
            other => panic!("Expected BalanceAdded, got {:?}", other),
        }
    }

    #[test]
    fn signal_types_need_no_payload() {
        for (t, expected) in [
            ("program_selected", PushMessage::ProgramSelected),
            ("program_started", PushMessage::ProgramStarted),
            ("program_paused", PushMessage::ProgramPaused),
            ("session_finished", PushMessage::SessionFinished),
        ] {
            let text = format!(r#"{{"t":"{}"}}"#, t);
            assert_eq!(PushMessage::decode(&text).unwrap(), expected);
        }
    }

    #[test]
    fn unknown_type_is_explicit() {
        let msg = PushMessage::decode(r#"{"t":"status_update","p":{}}"#).unwrap();
        assert_eq!(
            msg,
            PushMessage::Unknown {
                kind: "status_update".into()
            }
        );
        assert_eq!(msg.kind(), "status_update");
    }

    #[test]
    fn missing_payload_field_is_invalid_payload() {
        let result = PushMessage::decode(r#"{"t":"balance_update","p":{}}"#);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload { ref kind, .. }) if kind == "balance_update"
        ));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert!(matches!(
            PushMessage::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            PushMessage::decode(r#"{"p":{}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn envelope_to_json_uses_short_keys() {
        let envelope = PushEnvelope::new("program_paused", serde_json::json!({}));
        let json = envelope.to_json().unwrap();
        assert!(json.contains(r#""t":"program_paused""#));
        assert!(json.contains(r#""p":{}"#));
    }
}
