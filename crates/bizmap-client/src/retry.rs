//! Exponential back-off with jitter for directory requests.
//!
//! Only transient failures are retried: connection problems, timeouts,
//! throttling and 5xx responses. Anything else is returned on the first
//! attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::DirectoryError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &DirectoryError) -> bool {
    match err {
        DirectoryError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        DirectoryError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        DirectoryError::Deserialize { .. } | DirectoryError::InvalidBaseUrl(_) => false,
    }
}

/// Sleep before retry number `attempt` (1-based), before jitter.
pub(crate) fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(10);
    backoff_base_ms.saturating_mul(1u64 << shift).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// With `backoff_base_ms = 500` the sleeps are roughly 500 ms, 1 s, 2 s, and
/// so on, each scaled by a random factor in `[0.75, 1.25)` and capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DirectoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DirectoryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "directory request failed, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
