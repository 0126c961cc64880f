//! Request-level retry with capped exponential backoff

use std::future::Future;

use super::config::RetryConfig;
use super::error::DclError;

/// Errors that know whether resending the request might succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for DclError {
    fn is_retryable(&self) -> bool {
        DclError::is_retryable(self)
    }
}

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn with_retry<T, E, F, Fut>(retry: &RetryConfig, what: &str, mut attempt: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut n = 0;
    loop {
        match attempt().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && n + 1 < max_attempts => {
                let delay = retry.backoff(n);
                tracing::warn!(
                    "{} retryable error (attempt {}/{}): {} - retrying in {}ms",
                    what,
                    n + 1,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> DclError {
        DclError::Http {
            operation: "GET".into(),
            status: 503,
            message: "unavailable".into(),
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, DclError> = with_retry(&RetryConfig::immediate(), "GET", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(unavailable())
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let retry = RetryConfig {
            max_attempts: 2,
            ..RetryConfig::immediate()
        };
        let result: Result<(), DclError> = with_retry(&retry, "GET", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), DclError> = with_retry(&RetryConfig::immediate(), "GET", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DclError::InvalidResponse("bad".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
