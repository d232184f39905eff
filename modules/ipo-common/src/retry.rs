use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Server-provided wait, in seconds.
    fn retry_after(&self) -> Option<u64> {
        None
    }
}

impl Retryable for ai_client::AiError {
    fn is_retryable(&self) -> bool {
        ai_client::AiError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<u64> {
        ai_client::AiError::retry_after(self)
    }
}

impl Retryable for newsdata_client::NewsError {
    fn is_retryable(&self) -> bool {
        newsdata_client::NewsError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<u64> {
        newsdata_client::NewsError::retry_after(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt after `attempt` (1-based) failed.
    /// Linear in the attempt number, capped; a larger server hint wins.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let backoff = self.base_delay.saturating_mul(attempt).min(self.max_delay);
        match retry_after.map(Duration::from_secs) {
            Some(hint) if hint > backoff => hint,
            _ => backoff,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. The last error is returned.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let delay = policy.delay_for(attempt, e.retry_after());
                let delay_ms = delay.as_millis() as u64;
                warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %e,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
