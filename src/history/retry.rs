use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with fixed spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub spacing: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            spacing: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds or the policy runs out; the last error wins
pub async fn retry_with_spacing<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, max_attempts, e, policy.spacing
                );
                tokio::time::sleep(policy.spacing).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
