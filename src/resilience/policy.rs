use anyhow::Result;
use log::{error, info, warn};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: usize = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Bounded retry with a fixed pause between attempts.
///
/// There is no pause before the first attempt or after the last one, so
/// `n` attempts sleep at most `n - 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retry
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// The returned error is the last attempt's, with the attempt count
    /// added as context.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!("{} attempt {} failed: {:#}", label, attempt, e);
                    info!("Retrying {} in {:?}", label, self.delay);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "All {} {} attempts failed. Last error: {:#}",
                        self.max_attempts, label, e
                    );
                    return Err(e.context(format!(
                        "{} failed after {} attempt{}",
                        label,
                        self.max_attempts,
                        if self.max_attempts == 1 { "" } else { "s" }
                    )));
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }
}
