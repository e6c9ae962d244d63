//! Fixed-delay retry for catalog page requests.
//!
//! Every failure of a page request is retried except a malformed URL.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

fn is_retriable(err: &ScraperError) -> bool {
    !matches!(err, ScraperError::InvalidUrl { .. })
}

/// Runs `operation` up to `max_attempts` times in total, sleeping `delay`
/// between attempts.
///
/// Returns the first success, the first non-retriable error, or the last
/// error once the attempts are used up. A `max_attempts` of zero still makes
/// one attempt.
pub(crate) async fn retry_fixed<T, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "catalog request failed, retrying"
                );
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
