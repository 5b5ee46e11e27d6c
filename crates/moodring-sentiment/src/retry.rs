//! Retry with exponential back-off and jitter for outbound HTTP fetches.
//!
//! Timeouts, connection failures, 5xx and 429 responses are retried; every
//! other failure is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single HTTP attempt.
#[derive(Debug, Error)]
pub(crate) enum RequestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

pub(crate) fn is_retriable(err: &RequestError) -> bool {
    match err {
        RequestError::Http(e) => e.is_timeout() || e.is_connect(),
        RequestError::UnexpectedStatus { status, .. } => {
            *status == 429 || (500..600).contains(status)
        }
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// retriable errors.
///
/// The delay before retry `n` is `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`, capped
/// at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
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
                    "transient fetch error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
