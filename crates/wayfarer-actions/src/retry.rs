//! Retry policy: bounded attempts with backoff, emitting an audit event per
//! attempt, a success event when a retry recovers the call, and a terminal
//! event when the cap is exceeded.

use crate::classifier::is_retryable;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use wayfarer_types::error::CoreError;
use wayfarer_types::ports::strategy::BackoffStrategy;
use wayfarer_types::ports::{AuditEvent, AuditSink};

pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Arc<dyn BackoffStrategy>,
    pub audit: Arc<dyn AuditSink>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Arc<dyn BackoffStrategy>, audit: Arc<dyn AuditSink>) -> Self {
        Self { max_attempts, backoff, audit }
    }

    /// Runs `op` up to `max_attempts` times, sleeping `backoff`-determined
    /// delays between attempts, stopping early on a non-retryable error.
    /// Returns the attempt number the call finally succeeded on (1 means no
    /// retry was needed) so the caller can annotate a recovered result.
    pub async fn run<F, Fut, T>(&self, action_type: &str, session_id: Option<&str>, mut op: F) -> Result<(T, u32), CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        self.audit
                            .emit(AuditEvent::new(
                                "action.retry_success",
                                session_id.map(str::to_string),
                                serde_json::json!({ "action_type": action_type, "attempts": attempt }),
                            ))
                            .await;
                    }
                    return Ok((value, attempt));
                }
                Err(err) => {
                    let retryable = is_retryable(&err.message);
                    self.audit
                        .emit(AuditEvent::new(
                            "action.retry_attempt",
                            session_id.map(str::to_string),
                            serde_json::json!({
                                "action_type": action_type,
                                "attempt": attempt,
                                "error": err.message,
                                "retryable": retryable,
                            }),
                        ))
                        .await;

                    if !retryable || attempt >= self.max_attempts {
                        if attempt >= self.max_attempts && retryable {
                            self.audit
                                .emit(AuditEvent::new(
                                    "action.retry_terminal",
                                    session_id.map(str::to_string),
                                    serde_json::json!({
                                        "action_type": action_type,
                                        "attempts": attempt,
                                        "error": err.message,
                                    }),
                                ))
                                .await;
                            warn!(action_type, attempt, "retry attempts exhausted");
                        }
                        return Err(err);
                    }

                    let delay = self.backoff.delay_for_attempt(attempt);
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wayfarer_types::ports::strategy::FixedBackoff;

    struct NoopAudit;
    #[async_trait::async_trait]
    impl AuditSink for NoopAudit {
        async fn emit(&self, _event: AuditEvent) {}
    }

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(
            5,
            Arc::new(FixedBackoff(Duration::from_millis(1))),
            Arc::new(NoopAudit),
        );

        let attempts_clone = attempts.clone();
        let result = policy
            .run("click", None, || {
                let attempts = attempts_clone.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(CoreError::timeout("timeout waiting for selector"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        let (value, attempt) = result.unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempt, 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(
            5,
            Arc::new(FixedBackoff(Duration::from_millis(1))),
            Arc::new(NoopAudit),
        );

        let attempts_clone = attempts.clone();
        let result: Result<((), u32), CoreError> = policy
            .run("evaluate", None, || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::security_violation("security error: blocked pattern"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
