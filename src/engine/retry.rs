//! Retry policy for flaky operations (network calls to the LLM API).
//!
//! The runner itself never retries; callers wrap their operation in [`RetryPolicy::retry`] so
//! an item only becomes an `Error` after its attempts are used up.

use log::warn;
use std::future::Future;
use std::time::Duration;

use crate::utils::config::RetryConsts;

/// Policy for retrying a failed call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Single attempt.
    #[default]
    None,

    /// Fixed delay between attempts.
    Fixed {
        /// Total attempts, including the first.
        max_attempts: u32,
        delay: Duration,
    },

    /// Exponential backoff between attempts.
    Exponential {
        /// Total attempts, including the first.
        max_attempts: u32,
        /// Wait after the first failure (doubles each attempt).
        initial_delay: Duration,
        /// Maximum single wait.
        max_delay: Duration,
    },
}

impl RetryPolicy {
    /// Exponential backoff: 2 s, 4 s, 8 s ... capped at 30 s.
    pub fn exponential(max_attempts: u32) -> Self {
        Self::Exponential {
            max_attempts,
            initial_delay: Duration::from_secs(RetryConsts::INITIAL_DELAY_SECS),
            max_delay: Duration::from_secs(RetryConsts::MAX_DELAY_SECS),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Wait after failed attempt `attempt` (1-indexed) before the next one.
    ///
    /// Returns `None` when that attempt was the last one allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        match self {
            Self::None => None,
            Self::Fixed { delay, .. } => Some(*delay),
            Self::Exponential {
                initial_delay,
                max_delay,
                ..
            } => {
                // 2^(attempt-1) * initial_delay, capped at max_delay
                let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
                Some(initial_delay.saturating_mul(multiplier).min(*max_delay))
            }
        }
    }

    /// Total attempts allowed, including the first. Never less than 1.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } | Self::Exponential { max_attempts, .. } => {
                (*max_attempts).max(1)
            }
        }
    }

    /// Call `f` until it succeeds or attempts run out; returns the last error.
    pub async fn retry<T, F, Fut>(&self, mut f: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => match self.delay_for_attempt(attempt) {
                    Some(delay) => {
                        warn!(
                            "Attempt {}/{} failed: {:#}; retrying in {:?}",
                            attempt,
                            self.max_attempts(),
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}

/// Policy for LLM calls: 3 attempts, waiting 2 s then 4 s.
pub fn default_llm_policy() -> RetryPolicy {
    RetryPolicy::exponential(RetryConsts::MAX_ATTEMPTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_none_policy() {
        let policy = RetryPolicy::None;
        assert_eq!(policy.delay_for_attempt(1), None);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_fixed_policy() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_exponential_policy() {
        let policy = RetryPolicy::Exponential {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        };

        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for_attempt(5), None);
    }

    #[test]
    fn test_exponential_caps_at_max() {
        let policy = RetryPolicy::exponential(10);
        // 2 * 2^5 = 64 seconds, capped at 30
        assert_eq!(policy.delay_for_attempt(6), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_default_llm_policy_matches_tooling() {
        let policy = default_llm_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let out = policy
            .retry(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    anyhow::bail!("flaky {n}");
                }
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(out, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_returns_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(2, Duration::from_millis(1));
        let err = policy
            .retry(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(anyhow::anyhow!("failure {n}"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "failure 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_none_policy_calls_once() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::None
            .retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("nope"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
