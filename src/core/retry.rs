use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::domain::ports::{EnrichmentService, Subject};
use crate::utils::error::ServiceError;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_CAP_DELAY: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Backoff parameters shared by every service an orchestrator dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub cap_delay: Duration,
    /// Used when a service does not declare its own `max_retries`.
    pub default_max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            cap_delay: DEFAULT_CAP_DELAY,
            default_max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-based): `min(base * 2^(retry-1), cap)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        1u32.checked_shl(retry - 1)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.cap_delay, |delay| delay.min(self.cap_delay))
    }

    pub fn max_retries_for<S, E>(&self, service: &E) -> u32
    where
        S: Subject,
        E: EnrichmentService<S> + ?Sized,
    {
        service.max_retries().unwrap_or(self.default_max_retries)
    }
}

/// All attempts of one service failed.
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: ServiceError,
}

/// Runs one service with bounded retries and exponential backoff.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 執行服務，失敗時依退避策略重試
    ///
    /// Returns the number of attempts it took to succeed, or the last error
    /// once `max_retries + 1` attempts have failed.
    pub async fn execute<S, E>(&self, service: &E, subject: &S) -> Result<u32, RetryExhausted>
    where
        S: Subject,
        E: EnrichmentService<S> + ?Sized,
    {
        self.execute_tracked(service, subject, &AtomicU32::new(0))
            .await
    }

    /// Same as [`execute`](Self::execute), but publishes the number of the
    /// attempt in flight to `started` before each call, so a caller can still
    /// tell how far a service got if the task dies mid-attempt.
    pub async fn execute_tracked<S, E>(
        &self,
        service: &E,
        subject: &S,
        started: &AtomicU32,
    ) -> Result<u32, RetryExhausted>
    where
        S: Subject,
        E: EnrichmentService<S> + ?Sized,
    {
        let max_retries = self.policy.max_retries_for::<S, E>(service);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            started.store(attempt, Ordering::Relaxed);
            let err = match service.call(subject).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(
                            "✅ Service {} succeeded on attempt {} for subject {}",
                            service.name(),
                            attempt,
                            subject.subject_id()
                        );
                    }
                    return Ok(attempt);
                }
                Err(err) => err,
            };

            tracing::warn!(
                service = service.name(),
                subject_id = %subject.subject_id(),
                attempt,
                error = %err,
                "Service attempt failed"
            );

            if attempt > max_retries {
                tracing::error!(
                    "❌ Service {} gave up after {} attempts: {}",
                    service.name(),
                    attempt,
                    err
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }

            let delay = self.policy.delay_for(attempt);
            tracing::debug!(
                "⏳ Service {} retrying in {:?} (retry {}/{})",
                service.name(),
                delay,
                attempt,
                max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }
}
