use std::future::Future;
use std::time::Duration;

use balancer_core::Result;
use tokio::time::sleep;
use tracing::debug;

/// Outcome of a bounded poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied,
    Exhausted,
}

/// Fixed-delay retry budget for convergence polling.
///
/// Created fresh per migration attempt and consumed by one `poll` call.
/// The delay strategy lives here so the migration protocol itself stays
/// independent of how waiting is paced.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            interval,
        }
    }

    /// Runs `attempt` up to `max_attempts` times with a fixed delay
    /// between tries. The predicate's errors propagate immediately; an
    /// `Ok(true)` stops the poll as `Satisfied`.
    pub async fn poll<F, Fut>(&self, mut attempt: F) -> Result<PollOutcome>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        for n in 1..=self.max_attempts {
            if attempt(n).await? {
                return Ok(PollOutcome::Satisfied);
            }
            if n < self.max_attempts {
                debug!(
                    attempt = n,
                    max = self.max_attempts,
                    "condition not met, waiting before next attempt"
                );
                sleep(self.interval).await;
            }
        }
        Ok(PollOutcome::Exhausted)
    }
}
