//! Show the current session.

use anyhow::Result;
use kiosk_sync_client::EngineConfig;

use super::{connect, render_snapshot};

/// Run the status command.
pub async fn run(config: EngineConfig, json: bool) -> Result<()> {
    let engine = connect(config).await?;
    let snapshot = engine.snapshot().await;
    engine.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_snapshot(&snapshot));
    }
    Ok(())
}
