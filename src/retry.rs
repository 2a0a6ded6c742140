use crate::error::CatalogError;
use std::future::Future;
use std::time::Duration;

/// Coarse retry policy for catalog calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Delay before attempt `n` is `backoff * (n - 1)`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Determine if a catalog error is worth retrying
///
/// ## Retryable (returns true):
/// - Connection failures, timeouts
/// - HTTP 5xx
///
/// ## NOT retryable (returns false):
/// - 404: the entity vanished, asking again will not bring it back
/// - Other 4xx: the request itself is wrong
/// - Undecodable bodies
pub fn is_transient(error: &CatalogError) -> bool {
    match error {
        CatalogError::Transient(_) => true,
        CatalogError::Rejected { status, .. } => status.is_server_error(),
        CatalogError::NotFound(_) => false,
        CatalogError::Decode(_) => false,
    }
}

/// Run `request_fn` until it succeeds, fails with a non-transient error, or
/// the policy's attempts are exhausted. The last error is returned.
pub async fn with_retry<F, Fut, T>(
    policy: RetryPolicy,
    operation: &str,
    request_fn: F,
) -> Result<T, CatalogError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 1;
    loop {
        match request_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt < policy.attempts => {
                tracing::debug!(
                    operation = operation,
                    attempt = attempt,
                    error = %e,
                    "Transient catalog failure, retrying"
                );
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
