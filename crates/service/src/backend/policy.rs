//! Timeout and retry policy for backend requests.
//!
//! The default policy sends every request exactly once with the HTTP
//! client's own timeouts. Callers opt in to per-request timeouts or retries
//! through configuration; the services above the gateway never see it.

use std::time::Duration;

/// How the backend client sends a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    /// Per-attempt timeout. `None` leaves the HTTP client default in place.
    pub timeout: Option<Duration>,
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub backoff: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            max_attempts: 1,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RequestPolicy {
    /// Attempts actually made, never zero.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1_u32 << exponent)
    }

    /// Whether an HTTP status is worth another attempt.
    #[must_use]
    pub const fn is_retryable_status(status: u16) -> bool {
        matches!(status, 500..=599)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sends_once_without_timeout() {
        let policy = RequestPolicy::default();
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.timeout, None);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RequestPolicy {
            max_attempts: 0,
            ..RequestPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RequestPolicy {
            backoff: Duration::from_millis(100),
            ..RequestPolicy::default()
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RequestPolicy::is_retryable_status(503));
        assert!(!RequestPolicy::is_retryable_status(406));
        assert!(!RequestPolicy::is_retryable_status(409));
    }
}
