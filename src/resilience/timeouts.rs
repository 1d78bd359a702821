//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap a single upstream attempt with its own deadline
//! - Turn an elapsed deadline into `UpstreamError::Timeout`
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the attempt future is dropped on expiry
//! - Each attempt gets a fresh deadline, there is no shared request budget

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::relay::error::UpstreamError;

/// Run `attempt` under `limit`, attributing a timeout to `provider`.
pub async fn with_attempt_timeout<T, F>(provider: &str, limit: Duration, attempt: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout {
            provider: provider.to_string(),
            after: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out() {
        let result: Result<(), _> = with_attempt_timeout("slow", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert_eq!(
            result,
            Err(UpstreamError::Timeout {
                provider: "slow".into(),
                after: Duration::from_millis(50),
            })
        );
    }

    #[tokio::test]
    async fn test_fast_attempt_passes_through() {
        let result = with_attempt_timeout("fast", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
