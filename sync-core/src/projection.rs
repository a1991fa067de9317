//! Derived display quantities.
//!
//! Everything here is a pure function of store fields. Nothing in this
//! module is ever stored independently of its inputs.

use serde::Serialize;
use std::fmt;

/// Seconds of use the balance buys at the given per-second rate.
///
/// `floor(balance / rate)`; zero when there is no rate, the rate is not
/// positive, or the balance is not positive.
pub fn time_remaining(balance: f64, rate: Option<f64>) -> u64 {
    match rate {
        Some(rate) if rate > 0.0 && rate.is_finite() && balance > 0.0 => {
            (balance / rate).floor() as u64
        }
        _ => 0,
    }
}

/// Fill ratio of a progress bar, clamped to `[0, 1]`.
pub fn progress(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 || !ceiling.is_finite() {
        return 0.0;
    }
    (value / ceiling).clamp(0.0, 1.0)
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Simplified status shown between resyncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayStatus {
    /// No funds.
    Idle,
    /// A program is running.
    Running,
    /// Funds available, nothing running.
    Ready,
}

impl DisplayStatus {
    /// Derive from balance and the running flag.
    pub fn derive(balance: f64, running: bool) -> Self {
        if balance <= 0.0 {
            Self::Idle
        } else if running {
            Self::Running
        } else {
            Self::Ready
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
            Self::Ready => f.write_str("ready to start"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // time_remaining
    // ===========================================

    #[test]
    fn time_is_floor_of_balance_over_rate() {
        assert_eq!(time_remaining(1000.0, Some(16.6667)), 59);
        assert_eq!(time_remaining(1000.0, Some(10.0)), 100);
        assert_eq!(time_remaining(999.0, Some(10.0)), 99);
    }

    #[test]
    fn time_is_zero_without_usable_rate() {
        assert_eq!(time_remaining(1000.0, None), 0);
        assert_eq!(time_remaining(1000.0, Some(0.0)), 0);
        assert_eq!(time_remaining(1000.0, Some(-5.0)), 0);
        assert_eq!(time_remaining(1000.0, Some(f64::NAN)), 0);
    }

    #[test]
    fn time_is_zero_without_balance() {
        assert_eq!(time_remaining(0.0, Some(10.0)), 0);
        assert_eq!(time_remaining(-50.0, Some(10.0)), 0);
    }

    #[test]
    fn time_matches_formula_over_a_grid() {
        for balance in [0.0_f64, 1.0, 17.0, 250.5, 1000.0, 123456.0] {
            for rate in [0.5, 1.0, 3.0, 16.6667, 100.0] {
                let expected = (balance / rate).floor() as u64;
                assert_eq!(time_remaining(balance, Some(rate)), expected);
            }
        }
    }

    // ===========================================
    // progress / format / status
    // ===========================================

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress(50.0, 100.0), 0.5);
        assert_eq!(progress(150.0, 100.0), 1.0);
        assert_eq!(progress(-1.0, 100.0), 0.0);
        assert_eq!(progress(10.0, 0.0), 0.0);
    }

    #[test]
    fn format_time_pads_seconds() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(605), "10:05");
    }

    #[test]
    fn display_status_derivation() {
        assert_eq!(DisplayStatus::derive(0.0, true), DisplayStatus::Idle);
        assert_eq!(DisplayStatus::derive(100.0, true), DisplayStatus::Running);
        assert_eq!(DisplayStatus::derive(100.0, false), DisplayStatus::Ready);
    }
}
