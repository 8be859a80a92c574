//! Rate limiting and retry utilities for Google API calls.
//!
//! Transient failures (429, 5xx, timeouts, connection resets) are retried with
//! exponential backoff. Partial insert failures are NOT transient: the rows
//! that were accepted must not be resent, so they surface immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::GcpError;

fn is_retriable(err: &GcpError) -> bool {
    match err {
        GcpError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        GcpError::RateLimited { .. } | GcpError::Server { .. } => true,
        GcpError::Api { .. }
        | GcpError::Auth(_)
        | GcpError::Deserialize { .. }
        | GcpError::QueryIncomplete { .. }
        | GcpError::PartialFailure { .. }
        | GcpError::InvalidBaseUrl(_) => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` times.
///
/// The n-th retry waits `backoff_base_ms * 2^(n-1)` ms scaled by a random
/// factor in `[0.75, 1.25)`, capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GcpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GcpError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }
        attempt += 1;

        let capped = backoff_base_ms
            .saturating_mul(1u64 << (attempt - 1).min(10))
            .min(MAX_DELAY_MS);
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
            "transient Google API error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GcpError::Server {
                        status: 503,
                        context: "insertAll".to_owned(),
                    })
                } else {
                    Ok::<_, GcpError>("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn partial_failure_is_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(GcpError::PartialFailure {
                    failed_rows: 1,
                    errors: Vec::new(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(GcpError::PartialFailure { .. })));
    }

    #[tokio::test]
    async fn api_errors_are_returned_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(GcpError::Api {
                    status: 404,
                    context: "query".to_owned(),
                    message: "Not found: Table".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(GcpError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn exhausting_retries_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(GcpError::RateLimited {
                    context: "query".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(GcpError::RateLimited { .. })));
    }
}
