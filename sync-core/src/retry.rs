//! Bounded exponential backoff.
//!
//! A [`RetryPolicy`] is a small value object owned by whatever is retrying
//! (the status fetcher, the push channel, each action). It only computes
//! delays and counts attempts; scheduling is the caller's job.
//!
//! Formula: `delay = base_delay × 2^attempt`, for attempts `0..max_attempts`.
//! With the defaults that is 1s, 2s, 4s and then nothing.

use std::time::Duration;

/// Default number of automatic retries.
pub const MAX_RETRIES: u32 = 3;

/// Default backoff base.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry counter with a ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    current_attempt: u32,
}

impl RetryPolicy {
    /// Create a policy with the given ceiling and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            current_attempt: 0,
        }
    }

    /// Record a failure and return the delay before the next attempt.
    ///
    /// Returns `None` once the ceiling is reached; the counter then stays
    /// at the ceiling until [`reset`](Self::reset).
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_attempts {
            return None;
        }
        let delay = self.delay_for(self.current_attempt);
        self.current_attempt += 1;
        Some(delay)
    }

    /// Delay that attempt number `attempt` (0-based) waits for.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor)
    }

    /// Clear the counter after a success or an external trigger.
    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    /// Number of retries consumed so far.
    pub fn attempt(&self) -> u32 {
        self.current_attempt
    }

    /// Configured ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the ceiling has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.current_attempt >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_delays_double() {
        let mut policy = RetryPolicy::default();

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(4000)));
    }

    #[test]
    fn fourth_failure_schedules_nothing() {
        let mut policy = RetryPolicy::default();
        let delays: Vec<_> = (0..4).map(|_| policy.next_delay()).collect();

        assert_eq!(delays.iter().filter(|d| d.is_some()).count(), 3);
        assert_eq!(delays[3], None);
        assert!(policy.is_exhausted());
    }

    #[test]
    fn counter_never_exceeds_ceiling() {
        let mut policy = RetryPolicy::new(2, Duration::from_millis(10));
        for _ in 0..10 {
            policy.next_delay();
            assert!(policy.attempt() <= policy.max_attempts());
        }
        assert_eq!(policy.attempt(), 2);
    }

    #[test]
    fn reset_rearms_policy() {
        let mut policy = RetryPolicy::default();
        while policy.next_delay().is_some() {}
        assert!(policy.is_exhausted());

        policy.reset();

        assert_eq!(policy.attempt(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn zero_ceiling_never_retries() {
        let mut policy = RetryPolicy::new(0, BASE_DELAY);
        assert!(policy.is_exhausted());
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn large_attempts_saturate() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(16), policy.delay_for(40));
    }
}
