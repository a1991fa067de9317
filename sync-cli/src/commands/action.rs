//! One-shot session actions.

use anyhow::Result;
use kiosk_sync_client::{ActionOutcome, EngineConfig, Notice};
use std::time::Duration;

use super::{connect, Engine};

/// A user action to send.
#[derive(Debug, Clone)]
pub enum Action {
    /// Select (and start) a program.
    Select(String),
    /// Start the selected program.
    Start,
    /// Pause the running program.
    Pause,
    /// Finish the session.
    Finish,
    /// Credit the balance to a loyalty card.
    Credit(String),
    /// Decline the loyalty credit.
    Decline,
}

/// Run one action, waiting out scheduled retries.
pub async fn run(config: EngineConfig, action: Action) -> Result<()> {
    // Enough for every retry the policy can schedule.
    let patience = config
        .retry_policy()
        .delay_for(config.max_retries)
        .saturating_add(Duration::from_secs(1));
    let engine = connect(config).await?;

    let outcome = dispatch(&engine, &action).await;
    let result = match outcome {
        ActionOutcome::Confirmed => {
            println!("{:?}: confirmed", action);
            Ok(())
        }
        ActionOutcome::RetryScheduled { attempt, delay } => {
            println!("{:?}: failed, retry {} in {:?}", action, attempt, delay);
            let mut notices = engine.subscribe();
            // A retry that succeeds is silent; only failures are reported.
            let _ = tokio::time::timeout(patience, async {
                while let Ok(notice) = notices.recv().await {
                    println!("{}", notice);
                    if matches!(notice, Notice::ActionAbandoned { .. }) {
                        break;
                    }
                }
            })
            .await;
            Ok(())
        }
        ActionOutcome::Rejected(violation) => Err(anyhow::anyhow!("Rejected: {}", violation)),
        ActionOutcome::Abandoned => Err(anyhow::anyhow!("{:?}: gave up", action)),
        ActionOutcome::Discarded => Err(anyhow::anyhow!("Engine shut down")),
    };

    print!("{}", super::render_snapshot(&engine.snapshot().await));
    engine.shutdown().await;
    result
}

async fn dispatch(engine: &Engine, action: &Action) -> ActionOutcome {
    match action {
        Action::Select(program) => engine.select_program(program.as_str()).await,
        Action::Start => engine.start_program().await,
        Action::Pause => engine.pause_program().await,
        Action::Finish => engine.finish_session().await,
        Action::Credit(card) => engine.credit_to_loyalty_card(card).await,
        Action::Decline => engine.decline_credit().await,
    }
}
