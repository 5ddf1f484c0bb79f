//! Uniform retry policy for transient API failures.

use std::time::Duration;

use crate::error::ErrorKind;
use crate::APIResult;

/// Bounded exponential backoff, applied the same way at every call site:
/// rate-limit and network errors are retried with doubling delays, every
/// other kind propagates immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable: &'static [ErrorKind],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            retryable: &[ErrorKind::RateLimit, ErrorKind::Network],
        }
    }
}

impl RetryPolicy {
    /// Delay before re-attempting after `attempt` failures; doubles per
    /// attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        self.base_delay.saturating_mul(1 << exponent)
    }

    #[must_use]
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Runs `operation`, sleeping between retryable failures until it
    /// succeeds, a non-retryable error occurs, or attempts run out.
    pub fn run<T, F>(&self, description: &str, mut operation: F) -> APIResult<T>
    where
        F: FnMut() -> APIResult<T>,
    {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= self.max_attempts || !self.is_retryable(error.kind()) {
                        return Err(error);
                    }
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{description}: attempt {attempt}/{} failed ({error}); retrying in {delay:?}",
                        self.max_attempts
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::APIError;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    fn throttled() -> APIError {
        APIError::from_response(429, String::new())
    }

    #[test]
    fn delays_strictly_increase() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=policy.max_attempts {
            let delay = policy.delay_for(attempt);
            assert!(delay > previous, "attempt {attempt} did not back off");
            previous = delay;
        }
        assert_eq!(policy.delay_for(2), policy.base_delay * 2);
    }

    #[test]
    fn retries_rate_limits_until_attempts_run_out() {
        let policy = fast_policy();
        let mut calls = 0;
        let result: APIResult<()> = policy.run("create vendor", || {
            calls += 1;
            Err(throttled())
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn succeeds_after_transient_failure() {
        let policy = fast_policy();
        let mut calls = 0;
        let result = policy.run("fetch page", || {
            calls += 1;
            if calls < 3 {
                Err(throttled())
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[test]
    fn authentication_errors_are_not_retried() {
        let policy = fast_policy();
        let mut calls = 0;
        let result: APIResult<()> = policy.run("create account", || {
            calls += 1;
            Err(APIError::from_response(401, String::new()))
        });
        assert_eq!(calls, 1);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Authentication);
    }

    #[test]
    fn validation_errors_are_not_retried() {
        let policy = fast_policy();
        let mut calls = 0;
        let result: APIResult<()> = policy.run("create class", || {
            calls += 1;
            Err(APIError::from_response(400, String::new()))
        });
        assert_eq!(calls, 1);
        assert!(result.is_err());
    }
}
