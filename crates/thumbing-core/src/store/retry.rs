//! Redelivery policy for retryable handler failures.
//!
//! Exponential backoff with a small random jitter so concurrent redeliveries
//! of the same key don't line up.

use rand::Rng;
use std::time::Duration;

use crate::config::PipelineConfig;

/// How many times, and how far apart, a failed delivery is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Redeliveries after the first attempt
    pub max_retries: u32,
    /// Delay before the first redelivery
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Deliver exactly once, never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            base_delay_ms: config.retry_delay_ms,
        }
    }

    /// Delay before redelivery number `attempt` (0-based), jitter included.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = backoff_duration(attempt, self.base_delay_ms);
        let spread = (base.as_millis() as u64) / 10;
        let jitter = rand::thread_rng().gen_range(0..=spread);
        base + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}
