// src/fetch/retry.rs

use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::FetchError;

/// Exponential backoff: attempt `n` waits `initial_backoff_ms * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 0,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempts = 0;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempts < self.max_retries => {
                    attempts += 1;
                    let delay = self.backoff(attempts);
                    warn!(
                        %label,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!(%label, error = %e, "Exhausted retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff_ms: 1,
        }
    }

    fn empty() -> FetchError {
        FetchError::EmptyResponse {
            url: "http://example.test/pop.csv".into(),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let p = RetryPolicy {
            max_retries: 3,
            initial_backoff_ms: 500,
        };
        assert_eq!(p.backoff(1), Duration::from_millis(500));
        assert_eq!(p.backoff(2), Duration::from_millis(1000));
        assert_eq!(p.backoff(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_recovers_after_empty_responses() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out = fast(2)
            .run("pop", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(empty())
                } else {
                    Ok("csv")
                }
            })
            .await;
        assert_eq!(out.unwrap(), "csv");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out: Result<(), _> = fast(2)
            .run("pop", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(empty())
            })
            .await;
        assert!(matches!(out, Err(FetchError::EmptyResponse { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out: Result<(), _> = fast(5)
            .run("pop", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Decode {
                    url: "u".into(),
                    source: serde_json::from_str::<serde_json::Value>("]").unwrap_err(),
                })
            })
            .await;
        assert!(out.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
