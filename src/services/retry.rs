// src/services/retry.rs

//! Retry controller for transient-fallible operations.
//!
//! Only whitelisted failure classes (element timeout, stale element,
//! network blip) are retried; anything else, an auth redirect in
//! particular, propagates immediately so the session manager can react.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Retry policy: attempt cap and exponential backoff schedule.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Delay before attempt `attempt + 1` (0-based): base * 2^attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `op` up to `policy.max_attempts` times, backing off between
/// attempts. Non-transient errors are returned on first occurrence.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, context: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let Some(kind) = error.transient_kind() else {
                    return Err(error);
                };
                attempt += 1;
                if attempt >= policy.max_attempts {
                    log::warn!(
                        "{context}: giving up after {attempt} attempts ({kind}): {error}"
                    );
                    return Err(error);
                }
                let delay = policy.backoff(attempt - 1);
                log::debug!(
                    "{context}: attempt {attempt}/{} failed ({kind}), retrying in {delay:?}",
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Convenience: retry, then demote exhaustion to `None` with a log entry
/// so the caller can skip the candidate instead of aborting the run.
pub async fn with_retry_or_skip<T, F, Fut>(
    policy: RetryPolicy,
    context: &str,
    op: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match with_retry(policy, context, op).await {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.transient_kind().is_some() => {
            log::warn!("{context}: skipped after retry exhaustion: {error}");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AuthReason, TransientKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retries_exactly_max_attempts_on_timeout() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(fast_policy(), "always-timeout", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AppError::transient(
                    TransientKind::ElementTimeout,
                    "field",
                    "no match",
                ))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(fast_policy(), "auth", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::auth("rulings", AuthReason::Timeout)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(fast_policy(), "flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::transient(TransientKind::Network, "page", "blip"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn skip_variant_demotes_exhaustion() {
        let result: Result<Option<()>> = with_retry_or_skip(fast_policy(), "skip", || async {
            Err(AppError::transient(
                TransientKind::StaleElement,
                "row",
                "gone",
            ))
        })
        .await;
        assert_eq!(result.unwrap().is_none(), true);
    }

    #[tokio::test]
    async fn skip_variant_propagates_auth() {
        let result: Result<Option<()>> = with_retry_or_skip(fast_policy(), "skip", || async {
            Err(AppError::auth("updates", AuthReason::Unknown))
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn backoff_is_exponential() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }
}
