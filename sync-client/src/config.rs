//! Engine configuration.
//!
//! Loaded from a TOML file, from the environment, or both (file first,
//! environment overrides on top). Every field has a default, so an empty
//! file is a valid configuration.

use kiosk_sync_core::RetryPolicy;
use kiosk_sync_types::PUSH_PATH;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Controller REST base URL.
pub const ENV_CONTROLLER_API: &str = "KIOSK_CONTROLLER_API";
/// Controller push base address.
pub const ENV_CONTROLLER_WS: &str = "KIOSK_CONTROLLER_WS";
/// Per-request timeout, seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "KIOSK_REQUEST_TIMEOUT_SECS";
/// Periodic resync interval, seconds.
pub const ENV_POLL_INTERVAL: &str = "KIOSK_POLL_INTERVAL_SECS";

/// Configuration for [`SyncEngine`](crate::SyncEngine).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Controller REST base URL, e.g. `http://192.168.1.10:8000`.
    #[serde(default)]
    pub api_base_url: String,
    /// Controller push base address: `host:port` or a `ws://`/`wss://` URL.
    #[serde(default)]
    pub push_address: String,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Automatic retries per operation (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff base in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Push channel cooldown after reconnects run out (default: 30).
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Periodic resync interval in seconds; 0 disables (default: 60).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Currency label used in notices (default: UZS).
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    kiosk_sync_core::MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_currency() -> String {
    "UZS".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            push_address: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            cooldown_secs: default_cooldown_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            currency: default_currency(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given controller endpoints.
    pub fn new(api_base_url: &str, push_address: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            push_address: push_address.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override fields from an environment lookup.
    ///
    /// Unset or blank variables leave the field alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_CONTROLLER_API) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(address) = var(ENV_CONTROLLER_WS) {
            self.push_address = address.trim().to_string();
        }
        if let Some(value) = var(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT, &value)?;
        }
        if let Some(value) = var(ENV_POLL_INTERVAL) {
            self.poll_interval_secs = parse_secs(ENV_POLL_INTERVAL, &value)?;
        }
        Ok(())
    }

    /// Set the currency label.
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Set the periodic resync interval (0 disables).
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Full push channel URL.
    ///
    /// A bare `host:port` becomes `ws://host:port/ws`; a URL with a scheme
    /// keeps its scheme and gets `/ws` appended unless already present.
    pub fn push_url(&self) -> String {
        let address = self.push_address.trim().trim_end_matches('/');
        let base = if address.contains("://") {
            address.to_string()
        } else {
            format!("ws://{}", address)
        };
        if base.ends_with(PUSH_PATH) {
            base
        } else {
            format!("{}{}", base, PUSH_PATH)
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A fresh retry policy with the configured ceiling and base delay.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    /// Push channel cooldown.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Periodic resync interval, if enabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        })
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn default_config_matches_controller_client() {
        let config = EngineConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cooldown(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.currency, "UZS");

        let mut policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
api_base_url = "http://10.0.0.5:8000"
push_address = "10.0.0.5:8000"
max_retries = 5
poll_interval_secs = 0
currency = "USD"
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.5:8000");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.poll_interval(), None);
        assert_eq!(config.currency, "USD");
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base_url = \"http://kiosk:8000\"").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "http://kiosk:8000");
    }

    #[test]
    fn from_file_reports_missing_and_invalid() {
        let missing = EngineConfig::from_file(Path::new("/nonexistent/kiosk.toml"));
        assert!(matches!(missing, Err(ConfigError::ReadError { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_retries = \"many\"").unwrap();
        let invalid = EngineConfig::from_file(file.path());
        assert!(matches!(invalid, Err(ConfigError::ParseError { .. })));
    }

    // ===========================================
    // Environment
    // ===========================================

    #[test]
    fn env_overrides_endpoints() {
        let mut config = EngineConfig::default();
        config
            .apply_env(env(&[
                (ENV_CONTROLLER_API, "http://controller:8000"),
                (ENV_CONTROLLER_WS, "controller:8000"),
                (ENV_POLL_INTERVAL, "15"),
            ]))
            .unwrap();

        assert_eq!(config.api_base_url, "http://controller:8000");
        assert_eq!(config.push_url(), "ws://controller:8000/ws");
        assert_eq!(config.poll_interval_secs, 15);
    }

    #[test]
    fn blank_env_is_ignored() {
        let mut config = EngineConfig::new("http://a", "b:1");
        config.apply_env(env(&[(ENV_CONTROLLER_API, "  ")])).unwrap();
        assert_eq!(config.api_base_url, "http://a");
    }

    #[test]
    fn non_numeric_env_is_rejected() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env(env(&[(ENV_REQUEST_TIMEOUT, "ten")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                name: ENV_REQUEST_TIMEOUT,
                ..
            }
        ));
    }

    #[test]
    fn push_url_keeps_explicit_scheme() {
        let config = EngineConfig::new("", "wss://kiosk.example/");
        assert_eq!(config.push_url(), "wss://kiosk.example/ws");

        let config = EngineConfig::new("", "ws://kiosk:8000/ws");
        assert_eq!(config.push_url(), "ws://kiosk:8000/ws");
    }
}
