//! Push message reducer.
//!
//! Maps one decoded push message onto a [`SessionStore`] mutation and
//! returns the side effects the caller must carry out. When a message
//! does not carry the new truth (or cannot be trusted), the reducer asks
//! for a full resync instead of guessing.

use kiosk_sync_types::{PushMessage, SessionState};

use crate::notice::Notice;
use crate::store::SessionStore;

/// Why a resync was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncReason {
    /// A signal-only message (`program_selected`, ...) whose new value must be pulled.
    Signal(&'static str),
    /// A message type this terminal does not understand.
    UnknownType(String),
    /// A numeric field was not a number.
    InvalidField(&'static str),
    /// The frame could not be decoded at all.
    Undecodable(String),
}

/// Side effect requested by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Pull full status from the controller.
    Resync(ResyncReason),
    /// Show a notice.
    Notify(Notice),
    /// A field was dropped without mutating the store.
    Discarded {
        /// Field name.
        field: &'static str,
        /// Raw value, for the log.
        raw: String,
    },
}

/// Apply a decoded push message.
pub fn reduce(store: &mut SessionStore, message: &PushMessage) -> Vec<Effect> {
    match message {
        PushMessage::BalanceAdded(added) => match added.amount.value() {
            Some(amount) => {
                store.add_balance(amount);
                vec![Effect::Notify(Notice::FundsAdded {
                    amount,
                    currency: store.currency().to_string(),
                })]
            }
            None => invalid_number("amount", added.amount.raw()),
        },
        PushMessage::BalanceUpdate(update) => {
            let Some(balance) = update.balance.value() else {
                return invalid_number("balance", update.balance.raw());
            };
            store.set_balance(balance);

            match update.session_state.as_deref().map(str::parse::<SessionState>) {
                None => vec![],
                Some(Ok(state)) => {
                    store.set_session_state(state);
                    store.set_running(state == SessionState::Active);
                    vec![]
                }
                Some(Err(_)) => vec![
                    Effect::Discarded {
                        field: "session_state",
                        raw: update.session_state.clone().unwrap_or_default(),
                    },
                    Effect::Resync(ResyncReason::InvalidField("session_state")),
                ],
            }
        }
        PushMessage::ProgramSelected => vec![Effect::Resync(ResyncReason::Signal("program_selected"))],
        PushMessage::ProgramStarted => vec![Effect::Resync(ResyncReason::Signal("program_started"))],
        PushMessage::ProgramPaused => vec![Effect::Resync(ResyncReason::Signal("program_paused"))],
        PushMessage::SessionFinished => {
            store.reset_session();
            vec![Effect::Resync(ResyncReason::Signal("session_finished"))]
        }
        PushMessage::Unknown { kind } => vec![Effect::Resync(ResyncReason::UnknownType(kind.clone()))],
    }
}

/// Decode a text frame and apply it.
///
/// A frame that does not decode requests a resync and mutates nothing.
pub fn reduce_text(store: &mut SessionStore, text: &str) -> Vec<Effect> {
    match PushMessage::decode(text) {
        Ok(message) => reduce(store, &message),
        Err(e) => vec![Effect::Resync(ResyncReason::Undecodable(e.to_string()))],
    }
}

fn invalid_number(field: &'static str, raw: &serde_json::Value) -> Vec<Effect> {
    vec![
        Effect::Discarded {
            field,
            raw: raw.to_string(),
        },
        Effect::Resync(ResyncReason::InvalidField(field)),
    ]
}

/// Whether any effect asks for a resync.
pub fn wants_resync(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Resync(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_sync_types::{KioskStatus, Program, ProgramId, SessionId};

    fn store_with_balance(balance: f64) -> SessionStore {
        let mut store = SessionStore::new("UZS");
        store.apply_status(&KioskStatus {
            kiosk_state: 1,
            session_id: Some(SessionId::new("s")),
            session_state: Some(SessionState::Ready),
            balance: Some(balance.into()),
            programs: vec![Program::new("1", "Water", "10")],
        });
        store
    }

    fn added(amount: &str) -> String {
        format!(r#"{{"t":"balance_added","p":{{"amount":"{}"}}}}"#, amount)
    }

    fn update(balance: &str) -> String {
        format!(
            r#"{{"t":"balance_update","p":{{"balance":"{}","session_state":"READY"}}}}"#,
            balance
        )
    }

    // ===========================================
    // balance_added
    // ===========================================

    #[test]
    fn balance_added_adds_and_notifies_success() {
        let mut store = store_with_balance(200.0);

        let effects = reduce_text(&mut store, &added("300"));

        assert_eq!(store.balance(), 500.0);
        assert_eq!(store.high_water_balance(), 500.0);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::FundsAdded {
                amount: 300.0,
                currency: "UZS".into()
            })]
        );
        assert!(!wants_resync(&effects));
    }

    #[test]
    fn non_numeric_amount_is_discarded() {
        let mut store = store_with_balance(200.0);

        let effects = reduce_text(&mut store, &added("abc"));

        assert_eq!(store.balance(), 200.0);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Discarded { field: "amount", .. })));
        assert!(wants_resync(&effects));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    }

    // ===========================================
    // balance_update
    // ===========================================

    #[test]
    fn balance_update_is_idempotent() {
        for prior in [0.0, 120.0, 500.0, 9000.0] {
            let mut once = store_with_balance(prior);
            reduce_text(&mut once, &update("500"));

            let mut twice = store_with_balance(prior);
            reduce_text(&mut twice, &update("500"));
            reduce_text(&mut twice, &update("500"));

            assert_eq!(once.balance(), 500.0);
            assert_eq!(twice.balance(), once.balance());
            assert_eq!(twice.snapshot(), once.snapshot());
        }
    }

    #[test]
    fn balance_update_recomputes_time_for_selection() {
        let mut store = store_with_balance(1000.0);
        store.select_program(ProgramId::new("1"));
        assert_eq!(store.time_remaining(), 100);

        reduce_text(&mut store, &update("250"));

        assert_eq!(store.time_remaining(), 25);
    }

    #[test]
    fn balance_update_applies_session_state() {
        let mut store = store_with_balance(100.0);
        reduce_text(
            &mut store,
            r#"{"t":"balance_update","p":{"balance":"90","session_state":"ACTIVE"}}"#,
        );
        assert!(store.is_running());
        assert_eq!(store.snapshot().session_state, Some(SessionState::Active));
    }

    #[test]
    fn balance_update_with_unknown_state_keeps_balance_and_resyncs() {
        let mut store = store_with_balance(100.0);
        let effects = reduce_text(
            &mut store,
            r#"{"t":"balance_update","p":{"balance":"90","session_state":"WASHING"}}"#,
        );
        assert_eq!(store.balance(), 90.0);
        assert!(wants_resync(&effects));
    }

    #[test]
    fn non_numeric_balance_is_discarded() {
        let mut store = store_with_balance(100.0);
        let effects = reduce_text(&mut store, &update("NaN"));
        assert_eq!(store.balance(), 100.0);
        assert!(wants_resync(&effects));
    }

    #[test]
    fn high_water_tracks_every_sequence() {
        let mut store = store_with_balance(0.0);
        let frames = [
            added("100"),
            update("50"),
            added("400"),
            update("10"),
            update("1000"),
            added("-2000"),
        ];
        let mut previous_ceiling = 0.0;
        for frame in &frames {
            reduce_text(&mut store, frame);
            assert!(store.high_water_balance() >= store.balance());
            assert!(store.high_water_balance() >= previous_ceiling);
            previous_ceiling = store.high_water_balance();
        }
        assert_eq!(store.balance(), 0.0);
        assert_eq!(store.high_water_balance(), 1000.0);
    }

    // ===========================================
    // Signals and unknown types
    // ===========================================

    #[test]
    fn signals_request_resync_without_mutation() {
        for t in ["program_selected", "program_started", "program_paused"] {
            let mut store = store_with_balance(100.0);
            store.select_program(ProgramId::new("1"));
            let before = store.snapshot();

            let effects = reduce_text(&mut store, &format!(r#"{{"t":"{}"}}"#, t));

            assert_eq!(store.snapshot(), before);
            assert!(wants_resync(&effects));
        }
    }

    #[test]
    fn session_finished_resets_session_then_resyncs() {
        let mut store = store_with_balance(100.0);
        store.select_program(ProgramId::new("1"));
        store.set_running(true);

        let effects = reduce_text(&mut store, r#"{"t":"session_finished","p":{}}"#);

        assert!(store.selected_program().is_none());
        assert!(!store.is_running());
        assert_eq!(store.balance(), 0.0);
        assert_eq!(store.high_water_balance(), 0.0);
        assert_eq!(store.time_remaining(), 0);
        assert_eq!(store.max_time(), 0);
        assert_eq!(
            effects,
            vec![Effect::Resync(ResyncReason::Signal("session_finished"))]
        );
    }

    #[test]
    fn unknown_type_resyncs_and_does_not_fail() {
        let mut store = store_with_balance(100.0);
        let effects = reduce_text(&mut store, r#"{"t":"status_update","p":{"x":1}}"#);
        assert_eq!(
            effects,
            vec![Effect::Resync(ResyncReason::UnknownType("status_update".into()))]
        );
        assert_eq!(store.balance(), 100.0);
    }

    #[test]
    fn undecodable_frame_resyncs() {
        let mut store = store_with_balance(100.0);
        let effects = reduce_text(&mut store, "{{{");
        assert!(matches!(
            effects.as_slice(),
            [Effect::Resync(ResyncReason::Undecodable(_))]
        ));
        assert_eq!(store.balance(), 100.0);
    }
}
