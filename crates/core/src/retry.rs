//! Retry classification and backoff math.
//!
//! Pure functions only; the async loop lives in the shell's executor.

use std::collections::HashSet;
use std::time::Duration;

use crate::store::{codes, StoreError};

/// Client error codes retried by default. The store reports throttling as a
/// client error, so these must be listed explicitly.
pub const DEFAULT_RETRYABLE_CODES: &[&str] = &[
    codes::PROVISIONED_THROUGHPUT_EXCEEDED,
    codes::THROTTLING,
    codes::REQUEST_LIMIT_EXCEEDED,
    codes::TRANSACTION_CONFLICT,
];

/// How the executor retries a failing store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wall-clock budget measured from the first attempt.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Client error codes that are retried instead of failing fast.
    pub retryable_codes: HashSet<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(5),
            retryable_codes: DEFAULT_RETRYABLE_CODES
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_code(&self, code: &str) -> bool {
        self.retryable_codes.contains(code)
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.initial_backoff, self.max_backoff)
    }
}

/// What the executor does with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Re-raise the error unchanged.
    Rethrow,
    /// Fail immediately as a rejected request.
    Fatal,
    /// Back off and try again.
    Retry,
}

/// Classifies a failed attempt.
///
/// Passthrough codes win over everything else. Client-class errors are fatal
/// unless their code is retryable. Server and transport errors are retried.
pub fn classify(error: &StoreError, policy: &RetryPolicy, passthrough: &[&str]) -> Disposition {
    if passthrough.iter().any(|code| error.has_code(code)) {
        Disposition::Rethrow
    } else if error.is_client() && !policy.is_retryable_code(&error.code) {
        Disposition::Fatal
    } else {
        Disposition::Retry
    }
}

/// Exponential backoff: `initial * 2^attempt`, capped at `max`.
pub fn backoff_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    initial.checked_mul(factor).unwrap_or(max).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let initial = Duration::from_millis(50);
        let max = Duration::from_millis(300);

        assert_eq!(backoff_delay(0, initial, max), Duration::from_millis(50));
        assert_eq!(backoff_delay(1, initial, max), Duration::from_millis(100));
        assert_eq!(backoff_delay(2, initial, max), Duration::from_millis(200));
        assert_eq!(backoff_delay(3, initial, max), max);
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let max = Duration::from_secs(5);
        assert_eq!(backoff_delay(64, Duration::from_millis(50), max), max);
        assert_eq!(backoff_delay(31, Duration::from_secs(3600), max), max);
    }

    #[test]
    fn test_classify_server_error_is_retried() {
        let policy = RetryPolicy::default();
        let error = StoreError::server(codes::INTERNAL_SERVER_ERROR, "boom");

        assert_eq!(classify(&error, &policy, &[]), Disposition::Retry);
    }

    #[test]
    fn test_classify_transport_error_is_retried() {
        let policy = RetryPolicy::default();
        let error = StoreError::transport("DispatchFailure", "connection reset");

        assert_eq!(classify(&error, &policy, &[]), Disposition::Retry);
    }

    #[test]
    fn test_classify_validation_error_is_fatal() {
        let policy = RetryPolicy::default();
        let error = StoreError::validation("bad key");

        assert_eq!(classify(&error, &policy, &[]), Disposition::Fatal);
    }

    #[test]
    fn test_classify_throttling_is_retried() {
        let policy = RetryPolicy::default();
        let error = StoreError::client(codes::PROVISIONED_THROUGHPUT_EXCEEDED, "slow down");

        assert_eq!(classify(&error, &policy, &[]), Disposition::Retry);
    }

    #[test]
    fn test_classify_passthrough_wins() {
        let policy = RetryPolicy::default();
        let conditional = StoreError::client(codes::CONDITIONAL_CHECK_FAILED, "nope");
        let server = StoreError::server(codes::INTERNAL_SERVER_ERROR, "boom");

        assert_eq!(
            classify(&conditional, &policy, &[codes::CONDITIONAL_CHECK_FAILED]),
            Disposition::Rethrow
        );
        assert_eq!(
            classify(&server, &policy, &[codes::INTERNAL_SERVER_ERROR]),
            Disposition::Rethrow
        );
    }

    #[test]
    fn test_default_policy_codes() {
        let policy = RetryPolicy::default();

        assert!(policy.is_retryable_code(codes::THROTTLING));
        assert!(!policy.is_retryable_code(codes::VALIDATION));
        assert_eq!(policy.timeout, Duration::from_secs(20));
    }
}
