//! Retry policy for throttled remote calls.

use std::future::Future;
use std::time::Duration;

use permission_audit_sdk::RemoteError;
use tracing::{debug, warn};

use super::error::DomainError;
use crate::config::RetryConfig;

/// Bounded exponential backoff keyed to [`RemoteError::Throttled`].
///
/// The policy holds no state between calls; each [`RetryPolicy::execute`]
/// starts from the initial delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_INITIAL_DELAY)
    }
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);

    /// `max_attempts` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: None,
        }
    }

    /// Cap every single delay at `max_delay`.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    #[must_use]
    pub fn from_config(cfg: &RetryConfig) -> Self {
        let policy = Self::new(cfg.max_attempts, Duration::from_millis(cfg.initial_delay_ms));
        match cfg.max_delay_ms {
            Some(cap) => policy.with_max_delay(Duration::from_millis(cap)),
            None => policy,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the `failure`-th consecutive throttled attempt (1-based):
    /// `initial_delay * 2^(failure - 1)`, saturating, then capped.
    #[must_use]
    pub fn delay_after(&self, failure: u32) -> Duration {
        let factor = 1_u32
            .checked_shl(failure.saturating_sub(1))
            .unwrap_or(u32::MAX);
        let delay = self.initial_delay.saturating_mul(factor);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Run `operation`, retrying while it fails with `Throttled`.
    ///
    /// # Errors
    ///
    /// - `RetriesExhausted` after `max_attempts` throttled attempts
    /// - `Remote` immediately on any other failure
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "remote call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_throttled() => {
                    if attempt >= self.max_attempts {
                        warn!(operation, attempts = attempt, "giving up on throttled call");
                        return Err(DomainError::RetriesExhausted {
                            operation,
                            attempts: attempt,
                        });
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        "remote call throttled, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(DomainError::remote(operation, e)),
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::RefCell;

    use tokio::time::Instant;
    use tracing_test::traced_test;

    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(10, Duration::from_secs(5))
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn delay_doubles_per_failure() {
        let p = policy();
        assert_eq!(p.delay_after(1), Duration::from_secs(5));
        assert_eq!(p.delay_after(2), Duration::from_secs(10));
        assert_eq!(p.delay_after(3), Duration::from_secs(20));
        assert_eq!(p.delay_after(9), Duration::from_secs(5 * 256));
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let p = policy();
        assert_eq!(p.delay_after(40), Duration::from_secs(5).saturating_mul(u32::MAX));
    }

    #[test]
    fn delay_respects_cap() {
        let p = policy().with_max_delay(Duration::from_secs(30));
        assert_eq!(p.delay_after(2), Duration::from_secs(10));
        assert_eq!(p.delay_after(3), Duration::from_secs(20));
        assert_eq!(p.delay_after(4), Duration::from_secs(30));
        assert_eq!(p.delay_after(8), Duration::from_secs(30));
    }

    #[test]
    fn from_config_maps_fields() {
        let p = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            initial_delay_ms: 250,
            max_delay_ms: Some(1000),
        });
        assert_eq!(p.max_attempts(), 1);
        assert_eq!(p.delay_after(1), Duration::from_millis(250));
        assert_eq!(p.delay_after(5), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_exponentially_then_succeeds() {
        let attempts = RefCell::new(Vec::new());

        let result = policy()
            .execute("fetch_page", || {
                attempts.borrow_mut().push(Instant::now());
                let n = attempts.borrow().len();
                async move {
                    if n <= 3 {
                        Err(RemoteError::Throttled)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 4);
        let at = attempts.into_inner();
        assert_eq!(at.len(), 4);
        assert_close(at[1] - at[0], Duration::from_secs(5));
        assert_close(at[2] - at[1], Duration::from_secs(10));
        assert_close(at[3] - at[2], Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_exactly_max_attempts() {
        let calls = RefCell::new(0_u32);
        let started = Instant::now();

        let result: Result<(), _> = RetryPolicy::new(4, Duration::from_secs(1))
            .execute("get_role_assignments", || {
                *calls.borrow_mut() += 1;
                async { Err(RemoteError::Throttled) }
            })
            .await;

        assert_eq!(calls.into_inner(), 4);
        match result {
            Err(DomainError::RetriesExhausted {
                operation,
                attempts,
            }) => {
                assert_eq!(operation, "get_role_assignments");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        // 1 + 2 + 4 seconds of backoff; no sleep after the last attempt.
        assert_close(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let calls = RefCell::new(0_u32);
        let started = Instant::now();

        let result: Result<(), _> = policy()
            .execute("resolve_principal", || {
                *calls.borrow_mut() += 1;
                async { Err(RemoteError::AccessDenied("nope".to_owned())) }
            })
            .await;

        assert_eq!(calls.into_inner(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        let err = result.unwrap_err();
        assert_eq!(
            err.remote_source(),
            Some(&RemoteError::AccessDenied("nope".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_after_throttling_stops_retrying() {
        let calls = RefCell::new(0_u32);

        let result: Result<(), _> = policy()
            .execute("get_group_members", || {
                *calls.borrow_mut() += 1;
                let n = *calls.borrow();
                async move {
                    if n == 1 {
                        Err(RemoteError::Throttled)
                    } else {
                        Err(RemoteError::NotFound("group 4".to_owned()))
                    }
                }
            })
            .await;

        assert_eq!(calls.into_inner(), 2);
        assert!(matches!(result, Err(DomainError::Remote { .. })));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn throttling_is_logged() {
        let calls = RefCell::new(0_u32);

        let _ = policy()
            .execute("ensure_user", || {
                *calls.borrow_mut() += 1;
                let n = *calls.borrow();
                async move {
                    if n == 1 {
                        Err(RemoteError::Throttled)
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(logs_contain("remote call throttled, backing off"));
    }
}
