//! Retry with linear backoff.

use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Whether repeating an operation can change server state twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Reads, probes and deletes
    Idempotent,
    /// Playlist creation and item additions
    NonIdempotent,
}

/// Linear backoff: after failed attempt `n`, wait `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    retry_writes: bool,
}

impl RetryPolicy {
    /// `attempts` below 1 still runs the operation once.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            retry_writes: false,
        }
    }

    /// Retry non-idempotent operations on every failure.
    pub fn with_retry_writes(mut self, retry_writes: bool) -> Self {
        self.retry_writes = retry_writes;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether a failure of this kind may be followed by another attempt.
    ///
    /// A non-idempotent request is only repeated when it never reached the
    /// server, unless writes are explicitly opted in.
    pub fn is_retryable(&self, idempotency: Idempotency, error: &TransportError) -> bool {
        match idempotency {
            Idempotency::Idempotent => true,
            Idempotency::NonIdempotent => self.retry_writes || error.is_unsent(),
        }
    }

    /// Run `operation` until it succeeds, a failure is not retryable, or
    /// attempts run out. Returns the error of the last attempt.
    pub async fn run<T, F, Fut>(
        &self,
        context: &str,
        idempotency: Idempotency,
        mut operation: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 1;
        loop {
            debug!(context, attempt, attempts = self.attempts, "Attempt");

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(context, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < self.attempts && self.is_retryable(idempotency, &err) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        context,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt < self.attempts {
                        warn!(context, attempt, error = %err, "Not retrying non-idempotent request");
                    } else {
                        error!(context, attempts = self.attempts, error = %err, "All attempts failed");
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy::new(3, Duration::from_millis(2000));
        assert_eq!(policy.delay_after(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_zero_attempts_runs_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[test]
    fn test_write_retry_rules() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let refused = TransportError::refused("refused");
        let timeout = TransportError::Timeout("timed out".into());
        let server_error = TransportError::status(500);

        assert!(policy.is_retryable(Idempotency::Idempotent, &timeout));
        assert!(policy.is_retryable(Idempotency::NonIdempotent, &refused));
        assert!(!policy.is_retryable(Idempotency::NonIdempotent, &timeout));
        assert!(!policy.is_retryable(Idempotency::NonIdempotent, &server_error));

        let permissive = policy.with_retry_writes(true);
        assert!(permissive.is_retryable(Idempotency::NonIdempotent, &server_error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_non_retryable_write() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("create playlist", Idempotency::NonIdempotent, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TransportError::status(500)) }
            })
            .await;

        assert_eq!(result, Err(TransportError::status(500)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("get playlists", Idempotency::Idempotent, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(TransportError::status(500 + n as u16)) }
            })
            .await;

        assert_eq!(result, Err(TransportError::status(502)));
    }
}
