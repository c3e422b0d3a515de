//! Bounded retry with linear backoff.
//!
//! The coordinator knows nothing about error semantics: [`with_retry`]
//! retries every failure until attempts run out, then rethrows the last
//! error. Which failures deserve a retry is the caller's call —
//! [`with_retry_if`] takes that decision as a predicate (the pipeline
//! passes `GeneratorError::is_transient`).

use std::time::Duration;
use tracing::warn;

/// Run `operation` up to `attempts` times, sleeping `base_delay * n` after
/// the n-th failure. The last error is returned when attempts exhaust.
///
/// `attempts` is clamped to at least 1.
pub async fn with_retry<T, E, F, Fut>(
    operation: F,
    attempts: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(operation, attempts, base_delay, |_| true).await
}

/// Like [`with_retry`], but only re-invokes the operation when
/// `should_retry` accepts the error; a rejected error is returned
/// immediately with attempts left unspent.
pub async fn with_retry_if<T, E, F, Fut, P>(
    mut operation: F,
    attempts: u32,
    base_delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && should_retry(&e) => {
                let delay = base_delay * attempt;
                warn!(
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn succeeds_first_try() {
        let calls = Mutex::new(0u32);
        let result: Result<&str, &str> = with_retry(
            || {
                *calls.lock().unwrap() += 1;
                async { Ok("done") }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn two_failures_then_success() {
        let calls = Mutex::new(0u32);
        let result: Result<&str, String> = with_retry(
            || {
                let n = {
                    let mut guard = calls.lock().unwrap();
                    *guard += 1;
                    *guard
                };
                async move {
                    if n < 3 {
                        Err(format!("failure {n}"))
                    } else {
                        Ok("Success after retry")
                    }
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result.unwrap(), "Success after retry");
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn always_failing_raises_after_exactly_n_attempts() {
        let calls = Mutex::new(0u32);
        let result: Result<(), String> = with_retry(
            || {
                *calls.lock().unwrap() += 1;
                async { Err("still broken".to_string()) }
            },
            4,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result.unwrap_err(), "still broken");
        assert_eq!(*calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn zero_attempts_clamped_to_one() {
        let calls = Mutex::new(0u32);
        let result: Result<(), &str> = with_retry(
            || {
                *calls.lock().unwrap() += 1;
                async { Err("nope") }
            },
            0,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn predicate_rejection_stops_retrying_immediately() {
        let calls = Mutex::new(0u32);
        let result: Result<(), &str> = with_retry_if(
            || {
                *calls.lock().unwrap() += 1;
                async { Err("permanent") }
            },
            5,
            Duration::from_millis(1),
            |e: &&str| *e != "permanent",
        )
        .await;
        assert_eq!(result.unwrap_err(), "permanent");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_linear_in_attempt_index() {
        let start = tokio::time::Instant::now();
        let _: Result<(), &str> = with_retry(
            || async { Err("x") },
            3,
            Duration::from_secs(1),
        )
        .await;
        // Sleeps: 1s after attempt 1, 2s after attempt 2 → 3s total.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
