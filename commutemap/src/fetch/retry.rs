//! Retry policy for overlay API calls.

use std::time::Duration;

// =============================================================================
// Retry Policy Constants
// =============================================================================

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default initial delay for exponential backoff (1 second).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How a request handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries - fail immediately on error.
    None,

    /// Exponential backoff.
    ///
    /// The delay is multiplied after each failed attempt, up to a maximum.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Maximum delay cap.
        max_delay: Duration,
        /// Multiplier applied to the delay after each failure.
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    /// Three retries with 1s, 2s and 4s delays.
    fn default() -> Self {
        Self::with_retries(
            DEFAULT_RETRY_COUNT,
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    /// Exponential backoff allowing `retries` retries after the first
    /// attempt, starting at `initial_delay` and doubling.
    ///
    /// # Arguments
    ///
    /// * `retries` - Retries after the initial attempt (0 disables retrying)
    /// * `initial_delay` - Delay before the first retry
    pub fn with_retries(retries: u32, initial_delay: Duration) -> Self {
        if retries == 0 {
            return Self::None;
        }
        Self::ExponentialBackoff {
            max_attempts: retries.saturating_add(1),
            initial_delay,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Calculates the delay before a retry.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry number (1-based, where 1 is the first retry)
    ///
    /// # Returns
    ///
    /// The delay to wait, or `None` if no more retries are allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                // initial_delay * multiplier^(attempt-1)
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = initial_delay.as_millis() as f64 * factor;
                let capped = delay_ms.min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(capped as u64))
            }
        }
    }

    /// Returns the maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::ExponentialBackoff { max_attempts, .. } => (*max_attempts).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_zero_retries_is_none() {
        let policy = RetryPolicy::with_retries(0, Duration::from_secs(1));
        assert_eq!(policy, RetryPolicy::None);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for_attempt(1), None);
    }

    #[test]
    fn test_exponential_respects_max_delay() {
        let policy = RetryPolicy::with_retries(10, Duration::from_secs(8));
        assert_eq!(
            policy.delay_for_attempt(5),
            Some(Duration::from_secs(DEFAULT_MAX_DELAY_SECS))
        );
    }
}
