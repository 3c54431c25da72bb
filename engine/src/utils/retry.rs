//! Retry with exponential backoff for remote calls

use std::time::Duration;

/// Upper bound for a single backoff delay
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped
pub fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
    let factor = 2_u64.checked_pow(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_delay_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

/// Run `operation` until it succeeds, `is_retryable` rejects its error, or
/// `max_attempts` is used up.
///
/// Both outcomes carry the number of attempts made.
pub async fn retry_with_backoff_async<F, Fut, T, E, R>(
    max_attempts: u32,
    base_delay_ms: u64,
    is_retryable: R,
    mut operation: F,
) -> Result<(T, u32), (E, u32)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let error = match operation().await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) => e,
        };
        if attempt == max_attempts || !is_retryable(&error) {
            return Err((error, attempt));
        }
        let delay = backoff_delay(base_delay_ms, attempt);
        tracing::warn!(
            error = %error,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Remote call failed, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
