//! Bounded retry with exponential backoff for idempotent backend reads.
//!
//! The client has exactly one retry policy utility, applied uniformly instead
//! of per-call-site loops. Reads (availability, raffle detail, participation
//! lookup) may be retried on transient failures; mutations (reserve, upload
//! receipt, cancel, verify) are never retried automatically - a failed
//! mutation surfaces its error and waits for the user to re-trigger it.
//!
//! # Example
//!
//! ```rust
//! use boletera_runtime::retry::{RetryPolicy, retry_if};
//!
//! # async fn example() -> Result<(), String> {
//! let result = retry_if(
//!     RetryPolicy::reads(),
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("transient"),
//! )
//! .await?;
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// Retry policy configuration for exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reads()
    }
}

impl RetryPolicy {
    /// Policy for idempotent reads: up to 3 attempts total, delays of
    /// 200ms/400ms between them, capped at 2 seconds.
    #[must_use]
    pub const fn reads() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }

    /// Policy for mutations: a single attempt, never retried.
    #[must_use]
    pub const fn mutations() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Override the number of retries after the first attempt.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the initial delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: `delay = initial_delay * multiplier^attempt`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let delay_ms =
            (self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32)) as u64;

        let delay = Duration::from_millis(delay_ms);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Retry an async operation, but only while the error is transient.
///
/// Non-transient errors (client errors such as 401/403/404, validation
/// rejections) fail immediately without retrying; transient errors (network
/// failures, 5xx responses) are retried with exponential backoff until the
/// policy's retry budget is exhausted.
///
/// # Errors
///
/// Returns the first non-transient error encountered, or the last transient
/// error once all retries are exhausted.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: RetryPolicy,
    mut operation: F,
    is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            },
            Err(err) => {
                if !is_transient(&err) {
                    tracing::debug!(error = %err, "error is not transient, failing immediately");
                    return Err(err);
                }

                if attempt >= policy.max_retries {
                    tracing::warn!(attempt, error = %err, "operation failed after max retries");
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "transient failure, retrying"
                );

                sleep(delay).await;
                attempt += 1;
            },
        }
    }
}
