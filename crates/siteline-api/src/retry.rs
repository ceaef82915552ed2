// Bounded retry with exponential backoff and jitter.
//
// Only wraps idempotent operations -- the resource client never routes a
// device action through here. Deterministic failures (auth, validation,
// not-found, conflict, decode) propagate immediately; transient ones
// (transport, timeout, 5xx, 429) are retried until the attempt budget runs
// out, at which point the final error is surfaced unchanged inside
// `Error::RetriesExhausted` with the attempt count annotated.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Error;

/// Retry schedule for transient failures on idempotent operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first try. Treated as at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff for the given zero-based attempt index: exponential growth
    /// capped at `max_delay`, scaled by a jitter factor in `[0.5, 1.0]` so
    /// concurrent callers don't thunder in lockstep.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        let capped = exp.min(self.max_delay);
        let jitter = 0.5 + rand::random::<f64>() / 2.0;
        capped.mul_f64(jitter)
    }

    /// Run `op` under this policy. A rate-limited response's server-supplied
    /// retry-after hint takes precedence over the backoff schedule. The
    /// cancellation token, when present, is observed before each attempt and
    /// during every backoff delay -- never mid-request.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        op: F,
    ) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let budget = self.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
            }

            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt + 1 < budget => {
                    let delay = err.retry_after().unwrap_or_else(|| self.backoff(attempt));
                    warn!(
                        attempt = attempt + 1,
                        delay = ?delay,
                        error = %err,
                        "transient failure, backing off"
                    );
                    match cancel {
                        Some(token) => {
                            tokio::select! {
                                () = token.cancelled() => return Err(Error::Cancelled),
                                () = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(Error::RetriesExhausted {
                        attempts: budget,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
