//! Retry policy for delivery attempts

use crate::pipeline::collaborators::DeliveryError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff
///
/// Attempt `n` (1-based) that fails transiently is followed by a pause of
/// `base_delay × n` before attempt `n + 1`. No pause follows the last
/// attempt. A permanent failure stops immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Pause after the given failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `op` until it succeeds or the policy gives up
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Returns
    ///
    /// * `Ok(attempt)` - The attempt that succeeded
    /// * `Err(DeliveryError)` - The last failure
    pub async fn run<F, Fut>(&self, label: &str, mut op: F) -> Result<u32, DeliveryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), DeliveryError>>,
    {
        let mut last_error =
            DeliveryError::Permanent(format!("{}: retry policy allows no attempts", label));

        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(()) => return Ok(attempt),
                Err(error @ DeliveryError::Permanent(_)) => {
                    warn!(label, attempt, error = %error, "Permanent failure, giving up");
                    return Err(error);
                }
                Err(error) => {
                    warn!(label, attempt, error = %error, "Attempt failed");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }
}
