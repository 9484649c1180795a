//! Retry with backoff
//!
//! Generic retry helper for transient failures. The booking engine uses it
//! to re-issue a slot query while the portal still answers "not open yet".

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
    /// Maximum delay between retries (cap).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Constant-interval polling with no attempt cap; the caller's
    /// `should_retry` decides when to stop.
    pub fn polling(interval: Duration) -> Self {
        Self {
            max_attempts: u32::MAX,
            initial_delay: interval,
            backoff_multiplier: 1.0,
            max_delay: interval,
        }
    }
}

/// Execute an async operation, retrying while `should_retry` accepts the error.
///
/// # Example
/// ```ignore
/// let slots = retry_with_backoff(
///     RetryConfig::polling(Duration::from_secs(1)),
///     || session.list_available_slots(date, &site),
///     |err| err.is_transient(),
///     "list_available_slots",
/// ).await;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= config.max_attempts || !should_retry(&err) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Giving up"
                    );
                    return Err(err);
                }

                debug!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;

                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
            }
        }
    }
}
