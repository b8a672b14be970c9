//! Backoff between delivery attempts.
//!
//! A host that gets [`FlushOutcome::Retry`](crate::outcome::FlushOutcome::Retry)
//! for a batch sleeps [`RetryPolicy::backoff_delay`] and hands the same batch
//! back, giving the health check at the start of the next cycle time to adopt a
//! reconnected link. [`RetryPolicy::run`] covers the other case: opening the
//! sink while the server is still refusing connections.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// What to do with a failed start-up attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// The server may come up; try again after the backoff.
    Retry,
    /// Bad credentials, bad table name and the like. Give up now.
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    Fatal(E),
    /// Every allowed attempt failed; carries the last error.
    AttemptsExceeded(E),
}

/// Attempt limit and exponential delay shared by start-up and re-delivery.
///
/// `max_attempts` counts the first try, so a batch answered with `Retry` is
/// offered to the sink at most `max_attempts` times before it is dropped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// Start-up: a few quick attempts so a bad address fails fast.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made. A zero `max_delay` means no growth
    /// past `base_delay`.
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        let max_delay = match max_delay.is_zero() {
            true => base_delay,
            false => max_delay,
        };
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Re-delivery: enough attempts to ride out a server restart, since each
    /// one waits on a background reconnect.
    pub fn for_delivery() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Calls `op` until it succeeds, `classify` says stop, or the attempts run
    /// out. Sleeps [`backoff_delay`](Self::backoff_delay) between attempts.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }
            if attempt + 1 >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded(err));
            }

            sleep(self.backoff_delay(attempt)).await;
            attempt += 1;
        }
    }

    /// Wait before attempt `attempt + 1`: `base_delay * 2^attempt`, capped at
    /// `max_delay`.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}
