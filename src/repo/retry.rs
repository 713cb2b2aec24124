//! Retry logic with exponential backoff for repository queries

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::repo::error::QueryError;

/// Bounded retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: u32,
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1).saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-transient error,
    /// or the retry budget is spent
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what,
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        crate::config::RetryConfig::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::types::Snapshot;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> QueryError {
        QueryError::CommandFailed {
            program: "dnf".to_string(),
            snapshot: Snapshot::Current,
            status: Some(1),
            stderr: "Curl error (28): Timeout was reached".to_string(),
        }
    }

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            ..RetryPolicy::none()
        }
    }

    #[rstest]
    #[case(0, Duration::from_millis(100))]
    #[case(1, Duration::from_millis(200))]
    #[case(2, Duration::from_millis(400))]
    #[case(5, Duration::from_millis(1000))]
    fn delay_for_grows_exponentially_up_to_cap(#[case] attempt: u32, #[case] expected: Duration) {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            backoff_factor: 2,
        };

        assert_eq!(policy.delay_for(attempt), expected);
    }

    #[tokio::test]
    async fn run_retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = quick_policy(3)
            .run("query", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = quick_policy(2)
            .run("query", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert!(matches!(result, Err(QueryError::CommandFailed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_does_not_retry_permanent_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = quick_policy(5)
            .run("query", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(QueryError::Spawn {
                    program: "dnf".to_string(),
                    message: "No such file or directory".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(QueryError::Spawn { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
