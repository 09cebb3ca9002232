// Retry policy for segment fetches: bounded attempts, fixed-base backoff
// with a cap, and classification of transport/HTTP outcomes into
// transient vs. permanent.

use reqwest::StatusCode;
use std::time::Duration;

/// Configuration for segment retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the initial one.
    pub max_attempts: u32,
    /// Base delay between attempts. Actual delay = base * 2^attempt, capped.
    pub base_delay: Duration,
    /// Hard cap on the computed delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Compute the delay after a failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^attempt via a checked shift so misconfigured attempt counts
        // saturate instead of overflowing.
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Classify a reqwest transport error as transient or permanent.
///
/// Transient: connect, timeout, request, body read, and decode errors.
/// Permanent: redirect-policy and builder errors.
pub fn is_transient_reqwest_error(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() || e.is_decode()
}

/// Classify an HTTP error status as transient or permanent.
///
/// Server errors and 429 are worth retrying; other client errors will not
/// resolve on their own and fail fast.
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
