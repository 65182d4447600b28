use std::time::Duration;

use crate::ClientOptions;

/// Retry limits derived once from [`ClientOptions`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; a call makes at most `max_retries + 1` attempts.
    pub max_retries: usize,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl RetryPolicy {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            wait_min: options.retry_wait_min,
            wait_max: options.retry_wait_max,
        }
    }

    /// Delay inserted before retry number `retry` (1-based).
    ///
    /// `min(wait_min * 2^(retry - 1), wait_max)`; non-decreasing in `retry`.
    pub fn backoff(&self, retry: usize) -> Duration {
        let mut delay = self.wait_min;
        for _ in 1..retry {
            if delay >= self.wait_max {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        delay.min(self.wait_max)
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    pub fn allows_retry(&self, attempts: usize) -> bool {
        attempts <= self.max_retries
    }
}
