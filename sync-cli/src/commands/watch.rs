//! Follow the session live: notices as they arrive, a snapshot on each tick.

use anyhow::Result;
use kiosk_sync_client::{EngineConfig, Notice, NoticeLevel};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use super::{connect, render_snapshot};

/// Run the watch command until Ctrl-C.
pub async fn run(config: EngineConfig, every: Duration) -> Result<()> {
    let engine = connect(config).await?;
    let mut notices = engine.subscribe();
    let mut ticker = tokio::time::interval(every);

    println!("Watching {} (Ctrl-C to stop)", engine.config().push_url());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                println!();
                print!("{}", render_snapshot(&engine.snapshot().await));
            }
            notice = notices.recv() => match notice {
                Ok(notice) => println!("{}", format_notice(&notice)),
                Err(RecvError::Lagged(missed)) => println!("({} notices missed)", missed),
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level() {
        NoticeLevel::Success => "OK  ",
        NoticeLevel::Warning => "WARN",
        NoticeLevel::Alert => "FAIL",
    };
    format!("[{}] {}", tag, notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_tagged_by_level() {
        assert!(format_notice(&Notice::StatusLost).starts_with("[FAIL]"));
        assert!(format_notice(&Notice::StatusUnavailable).starts_with("[WARN]"));
        let funds = Notice::FundsAdded {
            amount: 300.0,
            currency: "UZS".to_string(),
        };
        assert!(format_notice(&funds).starts_with("[OK  ]"));
    }
}
