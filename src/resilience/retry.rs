//! Retry logic with exponential backoff.
//!
//! Retries are bounded by a maximum attempt count and a per-attempt delay
//! cap. Delays follow `min(base_delay * 2^i, max_delay)` for the i-th failed
//! attempt, with server-advertised `Retry-After` values taking precedence.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{LarkError, LarkResult};
use crate::observability::Metrics;

/// Observer invoked before each retry with the triggering error and the
/// 1-based number of the upcoming retry attempt.
pub type RetryObserver = Arc<dyn Fn(&LarkError, u32) + Send + Sync>;

/// Configuration for retry behavior.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound for any single retry delay.
    pub max_delay: Duration,
    /// Optional observer notified before each retry.
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            on_retry: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom bounds and no observer.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            on_retry: None,
        }
    }

    /// Creates a policy that performs exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Attaches an observer invoked before each retry.
    pub fn with_on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&LarkError, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// Backoff delay after the i-th failed attempt (0-indexed):
    /// `min(base_delay * 2^i, max_delay)`.
    ///
    /// A `base_delay` above `max_delay` is capped from the first retry on.
    pub fn backoff_delay(&self, failure_index: u32) -> Duration {
        let factor = 1u32.checked_shl(failure_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// Executes operations with retry logic and exponential backoff.
pub struct RetryExecutor {
    policy: RetryPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl RetryExecutor {
    /// Creates a new retry executor with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            metrics: None,
        }
    }

    /// Creates a retry executor with the default policy.
    pub fn with_defaults() -> Self {
        Self::new(RetryPolicy::default())
    }

    /// Attaches a metrics collector that records each retry.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes an operation, retrying retryable failures.
    ///
    /// Runs at most `max_retries + 1` attempts. A success returns
    /// immediately. A retryable failure waits `min(base_delay * 2^i,
    /// max_delay)` — or the error's own `retry_after()` when present — and
    /// tries again; the observer fires once per retry with the error and the
    /// 1-based upcoming attempt number. A non-retryable failure, or a failure
    /// on the final attempt, propagates the error unchanged.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> LarkResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LarkResult<T>>,
    {
        let mut attempts = 0u32;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempts > 0 {
                        tracing::info!("Operation succeeded after {} retry attempts", attempts);
                    }
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempts < self.policy.max_retries => {
                    let wait = e
                        .retry_after()
                        .unwrap_or_else(|| self.policy.backoff_delay(attempts));
                    attempts += 1;

                    if let Some(observer) = &self.policy.on_retry {
                        observer(&e, attempts);
                    }
                    if let Some(metrics) = &self.metrics {
                        metrics.record_retry();
                    }

                    tracing::warn!(
                        "Retryable error (attempt {}/{}): {}. Waiting {:?} before retry.",
                        attempts,
                        self.policy.max_retries,
                        e,
                        wait
                    );

                    sleep(wait).await;
                }
                Err(e) => {
                    if attempts > 0 {
                        tracing::error!("Operation failed after {} retry attempts: {}", attempts, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AuthenticationError, NetworkError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn timeout_error() -> LarkError {
        LarkError::Network(NetworkError::Timeout {
            duration: Duration::from_secs(10),
        })
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_millis(10_000));
        assert!(policy.on_retry.is_none());
    }

    #[test]
    fn test_policy_no_retry() {
        assert_eq!(RetryPolicy::no_retry().max_retries, 0);
    }

    #[test]
    fn test_backoff_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(800));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(30), Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_delay_caps_from_first_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_millis(150));
        for i in 0..8 {
            assert_eq!(policy.backoff_delay(i), Duration::from_millis(150));
        }
    }

    #[test]
    fn test_backoff_delay_huge_index_saturates() {
        let policy = RetryPolicy::new(64, Duration::from_millis(1), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(63), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_execute_succeeds_eventually() {
        let executor = RetryExecutor::new(RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(10),
        ));
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = executor
            .execute(|| {
                let attempts = attempts_clone.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(timeout_error())
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_exhausts_attempts() {
        let executor = RetryExecutor::new(RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(10),
        ));
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: LarkResult<()> = executor
            .execute(|| {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(timeout_error())
                }
            })
            .await;

        assert!(result.is_err());
        // Initial attempt + 2 retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_non_retryable_short_circuits() {
        let observer_calls = Arc::new(AtomicU32::new(0));
        let observer_clone = observer_calls.clone();
        let policy = RetryPolicy::default()
            .with_on_retry(move |_, _| {
                observer_clone.fetch_add(1, Ordering::SeqCst);
            });
        let executor = RetryExecutor::new(policy);
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: LarkResult<()> = executor
            .execute(|| {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(LarkError::Authentication(
                        AuthenticationError::RefreshTokenRejected {
                            message: "invalid_grant".into(),
                        },
                    ))
                }
            })
            .await;

        assert!(result.unwrap_err().needs_reauth());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(observer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_honors_retry_after() {
        let executor = RetryExecutor::new(RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(10),
        ));
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let start = std::time::Instant::now();
        let result = executor
            .execute(|| {
                let attempts = attempts_clone.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 1 {
                        Err(LarkError::Api(ApiError::RateLimited {
                            retry_after: Some(Duration::from_millis(50)),
                        }))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_execute_records_retries_in_metrics() {
        let metrics = Arc::new(Metrics::new());
        let executor = RetryExecutor::new(RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(10),
        ))
        .with_metrics(metrics.clone());

        let _: LarkResult<()> = executor.execute(|| async { Err(timeout_error()) }).await;
        assert_eq!(metrics.snapshot().retries, 2);
    }
}
