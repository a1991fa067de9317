//! Mock controller API for testing.
//!
//! Allows queueing status responses, forcing failures, and capturing sent
//! commands (with the time they were sent) for verification.

use async_trait::async_trait;
use kiosk_sync_types::{Command, KioskStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::{ApiError, ControllerApi};

/// Mock controller API.
///
/// Clones share state, so a test keeps one clone and hands the other to
/// the engine.
#[derive(Debug, Default, Clone)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    status_queue: VecDeque<KioskStatus>,
    last_status: KioskStatus,
    status_failures: VecDeque<String>,
    send_failures: VecDeque<String>,
    status_calls: Vec<Instant>,
    sent: Vec<(Instant, Command)>,
    latency: Duration,
}

impl MockApi {
    /// Create a mock with an empty default status.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockApiInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a status for the next `status()` call.
    ///
    /// Once the queue drains, the last returned status repeats.
    pub fn queue_status(&self, status: KioskStatus) {
        self.lock().status_queue.push_back(status);
    }

    /// Replace the status returned once the queue is empty.
    pub fn set_status(&self, status: KioskStatus) {
        self.lock().last_status = status;
    }

    /// Cause the next `status()` call to fail.
    pub fn fail_next_status(&self, error: &str) {
        self.lock().status_failures.push_back(error.to_string());
    }

    /// Cause the next `send()` call to fail.
    pub fn fail_next_send(&self, error: &str) {
        self.lock().send_failures.push_back(error.to_string());
    }

    /// Delay every response by `latency`. The call is recorded on entry.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    async fn respond<T>(&self, latency: Duration, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }

    /// Number of `status()` calls so far.
    pub fn status_calls(&self) -> usize {
        self.lock().status_calls.len()
    }

    /// When each `status()` call happened.
    pub fn status_call_times(&self) -> Vec<Instant> {
        self.lock().status_calls.clone()
    }

    /// Every command sent, failed attempts included.
    pub fn sent_commands(&self) -> Vec<Command> {
        self.lock().sent.iter().map(|(_, c)| c.clone()).collect()
    }

    /// When each command was sent.
    pub fn send_times(&self) -> Vec<Instant> {
        self.lock().sent.iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl ControllerApi for MockApi {
    async fn status(&self) -> Result<KioskStatus, ApiError> {
        let (latency, result) = {
            let mut inner = self.lock();
            inner.status_calls.push(Instant::now());

            let result = match inner.status_failures.pop_front() {
                Some(error) => Err(ApiError::Request(error)),
                None => {
                    if let Some(status) = inner.status_queue.pop_front() {
                        inner.last_status = status;
                    }
                    Ok(inner.last_status.clone())
                }
            };
            (inner.latency, result)
        };
        self.respond(latency, result).await
    }

    async fn send(&self, command: &Command) -> Result<(), ApiError> {
        let (latency, result) = {
            let mut inner = self.lock();
            inner.sent.push((Instant::now(), command.clone()));

            let result = match inner.send_failures.pop_front() {
                Some(error) => Err(ApiError::Request(error)),
                None => Ok(()),
            };
            (inner.latency, result)
        };
        self.respond(latency, result).await
    }
}
