//! Configuration resolution for kiosk-sync.
//!
//! Precedence, lowest to highest: defaults, `--config` TOML file,
//! `KIOSK_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use kiosk_sync_client::EngineConfig;
use std::path::Path;

/// Flag overrides collected from the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// `--api`
    pub api_base_url: Option<String>,
    /// `--push`
    pub push_address: Option<String>,
    /// `--poll`
    pub poll_interval_secs: Option<u64>,
}

/// Build the engine configuration.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<EngineConfig> {
    resolve_with(path, overrides, |name| std::env::var(name).ok())
}

fn resolve_with<F>(path: Option<&Path>, overrides: &Overrides, lookup: F) -> Result<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config
        .apply_env(lookup)
        .context("Invalid environment configuration")?;

    if let Some(url) = &overrides.api_base_url {
        config.api_base_url = url.clone();
    }
    if let Some(address) = &overrides.push_address {
        config.push_address = address.clone();
    }
    if let Some(secs) = overrides.poll_interval_secs {
        config.poll_interval_secs = secs;
    }

    if config.api_base_url.trim().is_empty() {
        anyhow::bail!("No controller API configured. Pass --api or set KIOSK_CONTROLLER_API.");
    }
    if config.push_address.trim().is_empty() {
        anyhow::bail!("No push address configured. Pass --push or set KIOSK_CONTROLLER_WS.");
    }
    Ok(config)
}
