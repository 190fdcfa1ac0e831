//! Retry with exponential backoff
//!
//! Used around LLM and store calls that fail for transport reasons. The
//! orchestrator runs with two attempts, i.e. a single retry.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set initial delay
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (1-based)
    fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64) as u64;

        let jitter_ms = if self.jitter {
            clock_jitter(capped_ms / 4)
        } else {
            0
        };
        Duration::from_millis(capped_ms + jitter_ms)
    }
}

fn clock_jitter(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);
    nanos % max
}

/// Error returned once retrying gave up
#[derive(Debug)]
pub struct RetryError<E> {
    /// The last error encountered
    pub last_error: E,
    /// Attempts made
    pub attempts: u32,
}

impl<E> RetryError<E> {
    /// Unwrap the last error
    pub fn into_inner(self) -> E {
        self.last_error
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gave up after {} attempt(s): {}", self.attempts, self.last_error)
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for RetryError<E> {}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
///
/// ```ignore
/// let reply = retry_with_backoff(
///     &RetryConfig::default(),
///     || provider.complete_with_tools(request.clone()),
///     jarvis_llm::Error::is_transport,
/// )
/// .await;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(attempt, error = %e, "Giving up");
                return Err(RetryError {
                    last_error: e,
                    attempts: attempt,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    enum Failure {
        Transient,
        Fatal,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn quick() -> RetryConfig {
        RetryConfig::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[test]
    fn test_delays_grow_and_cap() {
        let config = RetryConfig::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_jitter(false);
        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(300));
        assert_eq!(RetryConfig::new().with_max_attempts(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(
            &quick(),
            || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(Failure::Transient)
                    } else {
                        Ok("answer")
                    }
                }
            },
            |e| matches!(e, Failure::Transient),
        )
        .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = retry_with_backoff(
            &quick(),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Failure::Transient) }
            },
            |e| matches!(e, Failure::Transient),
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = retry_with_backoff(
            &quick().with_max_attempts(5),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Failure::Fatal) }
            },
            |e| matches!(e, Failure::Transient),
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.into_inner(), Failure::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
