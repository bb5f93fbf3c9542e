//! Retry with exponential backoff
//!
//! Used at the operation level (announcement publish, one-off reads), never
//! inside the tracker's routine polling — polls have their own cadence and
//! swallow transient failures instead.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (0-indexed failure count).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(backoff_secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Whether another attempt is allowed after `failures` failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}

/// Run `operation` until it succeeds or the attempt ceiling is hit, backing
/// off exponentially between attempts. The last error is returned to the
/// caller of this specific operation; nothing else is torn down.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    what: &'static str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if !config.should_retry(attempt) {
                    warn!(
                        attempts = attempt,
                        error = %error,
                        "{what} failed permanently"
                    );
                    return Err(error);
                }
                let backoff = config.backoff_for_attempt(attempt - 1);
                warn!(
                    attempt,
                    max = config.max_attempts,
                    ?backoff,
                    error = %error,
                    "{what} failed; retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(4),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.backoff_for_attempt(5), Duration::from_secs(4)); // capped
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        };
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry(&config, "test op", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("flaky".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_ceiling() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = with_retry(&config, "test op", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {attempt}")) }
        })
        .await;

        // Exactly three attempts, last error surfaced.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "failure 2");
    }
}
