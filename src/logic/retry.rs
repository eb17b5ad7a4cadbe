use std::future::Future;
use std::time::Duration;

use crate::config::ComputeConfig;
use crate::error::AppError;

/// Single retry/backoff policy shared by every upstream call site
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub retryable: fn(&AppError) -> bool,
}

impl RetryPolicy {
    /// Solve calls are expensive upstream: retry once, and only when the
    /// request never reached the service.
    pub fn for_solve(config: &ComputeConfig) -> Self {
        Self {
            max_attempts: config.solve_attempts.clamp(1, 2),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
            retryable: retry_unreachable,
        }
    }

    /// Health and version probes are idempotent reads.
    pub fn for_probe(config: &ComputeConfig) -> Self {
        Self {
            max_attempts: config.probe_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
            retryable: retry_unreachable_or_server_error,
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` counts from 1
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && (self.retryable)(&e) => {
                    let delay = self.backoff(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn retry_unreachable(error: &AppError) -> bool {
    matches!(error, AppError::UpstreamUnreachable(_))
}

fn retry_unreachable_or_server_error(error: &AppError) -> bool {
    match error {
        AppError::UpstreamUnreachable(_) => true,
        AppError::UpstreamRejected { status, .. } => *status >= 500,
        _ => false,
    }
}
