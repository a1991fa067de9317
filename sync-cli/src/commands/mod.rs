//! CLI command implementations.

pub mod action;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use kiosk_sync_client::{
    EngineConfig, FetchOutcome, HttpApi, SessionSnapshot, SyncEngine, WsConnector,
};

/// Engine used by every command.
pub type Engine = SyncEngine<HttpApi, WsConnector>;

/// Create the engine and run bootstrap.
///
/// Fails if the first status fetch does not succeed; one-shot commands
/// have nothing to show without it.
pub async fn connect(config: EngineConfig) -> Result<Engine> {
    let engine = SyncEngine::http(config).context("Invalid controller API address")?;
    match engine.start().await {
        FetchOutcome::Applied => Ok(engine),
        outcome => {
            engine.shutdown().await;
            anyhow::bail!("Controller unreachable ({:?})", outcome)
        }
    }
}

/// Render a snapshot for the terminal.
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let session = snapshot
        .session_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());
    let state = snapshot
        .session_state
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    out.push_str(&format!("Session:    {} ({})\n", session, state));
    out.push_str(&format!(
        "Balance:    {:.2} {} (peak {:.2})\n",
        snapshot.balance, snapshot.currency, snapshot.high_water_balance
    ));
    out.push_str(&format!("Status:     {}\n", snapshot.status));
    out.push_str(&format!(
        "Time left:  {} ({:.0}%)\n",
        snapshot.time_display,
        snapshot.time_progress * 100.0
    ));
    out.push_str(&format!("Connection: {:?}\n", snapshot.connection));
    out.push_str("Programs:\n");
    for program in &snapshot.programs {
        let marker = if snapshot.selected_program.as_ref() == Some(&program.id) {
            if snapshot.running {
                ">"
            } else {
                "*"
            }
        } else {
            " "
        };
        let rate = program
            .rate()
            .map(|r| format!("{}/s", r))
            .unwrap_or_else(|| "invalid price".to_string());
        out.push_str(&format!(
            "  {} [{}] {} - {}\n",
            marker, program.id, program.name, rate
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_sync_core::SessionStore;
    use kiosk_sync_types::{KioskStatus, NumericField, Program, ProgramId, SessionId};

    #[test]
    fn snapshot_marks_running_program() {
        let mut store = SessionStore::new("UZS");
        store.apply_status(&KioskStatus {
            session_id: Some(SessionId::new("sess-9")),
            balance: Some(NumericField::from(1000.0)),
            programs: vec![
                Program::new("1", "Water", "16.6667"),
                Program::new("2", "Foam", "oops"),
            ],
            ..KioskStatus::default()
        });
        store.select_program(ProgramId::from("1"));
        store.set_running(true);

        let text = render_snapshot(&store.snapshot());

        assert!(text.contains("sess-9"));
        assert!(text.contains("1000.00 UZS"));
        assert!(text.contains("0:59"));
        assert!(text.contains("> [1] Water"));
        assert!(text.contains("[2] Foam - invalid price"));
    }
}
