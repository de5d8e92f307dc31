//! Reconnection backoff policy
//!
//! When the socket drops abnormally, the policy decides how long to wait
//! before the next attempt and when to stop trying altogether. The delay is
//! a pure function of the attempt count, so the schedule is fully
//! predictable: `min(initial * 2^attempt, cap)` until the attempt ceiling.
//!
//! # Examples
//!
//! ```rust
//! use webrpc_client::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let policy = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30))
//!     .with_max_attempts(10);
//!
//! assert_eq!(policy.delay_for(0), Some(Duration::from_secs(1)));
//! assert_eq!(policy.delay_for(3), Some(Duration::from_secs(8)));
//! assert_eq!(policy.delay_for(10), None);
//! ```

use std::time::Duration;

/// Ceiling on any single reconnect delay
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Capped exponential backoff with an attempt ceiling
///
/// Optional jitter spreads simultaneous reconnects from many dashboards
/// hitting the same daemon; it is off by default so the delay sequence is
/// exact.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial: Duration,
    cap: Duration,
    max_attempts: Option<u32>,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a new backoff policy
    pub fn new(initial: Duration, cap: Duration) -> Self {
        Self {
            initial,
            cap,
            max_attempts: None,
            jitter: false,
        }
    }

    /// Set the number of attempts after which reconnection stops permanently
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Add random jitter (0-25% of the delay) to each attempt
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Delay before attempt `attempt` (0-indexed)
    ///
    /// Returns `None` once the attempt ceiling is reached; the caller must
    /// stop retrying permanently.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        let base = self.initial.as_millis() as u64;
        let doubled = base.saturating_mul(2u64.saturating_pow(attempt));
        let delay = doubled.min(self.cap.as_millis() as u64);

        let final_delay = if self.jitter {
            use rand::Rng;
            delay + rand::thread_rng().gen_range(0..=delay / 4)
        } else {
            delay
        };

        Some(Duration::from_millis(final_delay))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), MAX_RECONNECT_DELAY).with_max_attempts(10)
    }
}
