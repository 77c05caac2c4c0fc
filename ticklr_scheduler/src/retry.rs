use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Gave up after {attempts} attempts: {last_error:#}")]
    Exhausted {
        attempts: u32,
        last_error: anyhow::Error,
    },
    #[error("Cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

/// Fixed-delay retry of a fallible async operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds or the attempts run out. `operation` receives the
    /// 1-based attempt number. The wait between attempts ends early on cancellation.
    pub async fn run<T, F, Fut>(
        &self,
        cancellation_token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= self.attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            log::warn!(
                "Attempt failed, retrying [attempt = {attempt}, max_attempts = {}, delay = {:?}]: {error:#}",
                self.attempts,
                self.delay
            );

            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(self.delay) => {}
            }

            attempt += 1;
        }
    }
}
