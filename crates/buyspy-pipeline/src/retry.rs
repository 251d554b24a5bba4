//! Backoff and retry helpers shared by the search collector and the
//! extraction coordinator.

use std::future::Future;
use std::time::Duration;

const MAX_DELAY_MS: u64 = 10_000;

/// Delay before retry number `attempt` (1-based):
/// `base_ms × 2^(attempt-1)` with ±25 % jitter, capped at 10 s.
///
/// | Retry | Delay with `base_ms = 500` |
/// |-------|----------------------------|
/// | 1     | 500 ms ± 25 %              |
/// | 2     | 1 000 ms ± 25 %            |
/// | 3     | 2 000 ms ± 25 %            |
pub(crate) fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let exponent = attempt.saturating_sub(1).min(16);
    let computed = base_ms.saturating_mul(1u64 << exponent);
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(jittered.min(MAX_DELAY_MS))
}

/// Runs `operation`, retrying up to `max_retries` more times while
/// `should_retry` says the last result is worth another attempt.
///
/// The final result is returned as-is, whether `Ok` or `Err`, so callers
/// decide what an exhausted-but-`Ok` result means.
pub(crate) async fn retry_with_backoff<T, E, F, Fut, P>(
    max_retries: u32,
    backoff_base_ms: u64,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&Result<T, E>) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        let result = operation().await;
        if attempt >= max_retries || !should_retry(&result) {
            return result;
        }
        attempt += 1;
        let delay = backoff_delay(backoff_base_ms, attempt);
        match &result {
            Err(e) => tracing::warn!(
                attempt,
                max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %e,
                "transient error; retrying after backoff"
            ),
            Ok(_) => tracing::warn!(
                attempt,
                max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "unusable result; retrying after backoff"
            ),
        }
        tokio::time::sleep(delay).await;
    }
}
