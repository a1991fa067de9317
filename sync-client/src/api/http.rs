//! reqwest-backed controller client.

use async_trait::async_trait;
use kiosk_sync_types::{Command, KioskStatus, STATUS_PATH};
use reqwest::header::ACCEPT;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{ApiError, ControllerApi};

/// Query parameter that defeats intermediate caches.
const CACHE_BUST_PARAM: &str = "_t";

/// HTTP client for the controller REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn cache_bust() -> [(&'static str, String); 1] {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    [(CACHE_BUST_PARAM, millis.to_string())]
}

fn map_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Request(error.to_string())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

#[async_trait]
impl ControllerApi for HttpApi {
    async fn status(&self) -> Result<KioskStatus, ApiError> {
        let response = self
            .client
            .get(self.url(STATUS_PATH))
            .query(&cache_bust())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_error)?;

        let body = check_status(response)?.text().await.map_err(map_error)?;
        Ok(KioskStatus::from_json(&body)?)
    }

    async fn send(&self, command: &Command) -> Result<(), ApiError> {
        tracing::debug!("POST {}", command.path());

        let response = self
            .client
            .post(self.url(command.path()))
            .query(&cache_bust())
            .header(ACCEPT, "application/json")
            .json(&command.body())
            .send()
            .await
            .map_err(map_error)?;

        check_status(response).map(|_| ())
    }
}
