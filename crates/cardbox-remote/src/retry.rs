//! Retry helper for remote calls
//!
//! Transient errors (network, rate limiting, server errors) are retried
//! with exponential backoff: 1s, 2s, ... up to the configured attempt
//! count. Non-transient errors are returned immediately.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

/// Determines whether an error is transient (retryable)
///
/// Transient errors include:
/// - Network errors (connection refused, timeout, DNS)
/// - Rate limiting (HTTP 429)
/// - Server errors (HTTP 5xx)
pub fn is_transient_error(err: &anyhow::Error) -> bool {
    let err_str = format!("{err:#}").to_lowercase();

    // Network errors
    if err_str.contains("network")
        || err_str.contains("connection")
        || err_str.contains("timeout")
        || err_str.contains("dns")
        || err_str.contains("reset by peer")
        || err_str.contains("broken pipe")
    {
        return true;
    }

    // Rate limiting
    if err_str.contains("429")
        || err_str.contains("too many requests")
        || err_str.contains("rate limit")
    {
        return true;
    }

    // Server errors (5xx)
    if err_str.contains("500")
        || err_str.contains("502")
        || err_str.contains("503")
        || err_str.contains("504")
        || err_str.contains("server error")
    {
        return true;
    }

    false
}

/// Executes an async operation with exponential backoff retry
///
/// `max_attempts` counts the first try; attempt `n` (1-based) sleeps
/// `base_delay * 2^(n-1)` before the next try. The last error is surfaced
/// on exhaustion.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    base_delay: Duration,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error: Option<anyhow::Error> = None;

    for attempt in 1..=max_attempts {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt < max_attempts && is_transient_error(&err) {
                    let delay = base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(err);
                } else {
                    return Err(err);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("Retry exhausted for {}", operation_name)))
}
