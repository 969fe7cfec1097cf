//! Retry harness shared by every fallible step.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use super::error::Step;

/// How often and how patiently a step is retried.
///
/// `max_retries = 3` with `[1000, 5000, 15000]` gives four attempts: one
/// immediately, then one after each delay in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_schedule_ms: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_schedule_ms: vec![1000, 5000, 15000],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_schedule_ms: Vec<u64>) -> Self {
        Self {
            max_retries,
            backoff_schedule_ms,
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the given retry (1-based). Past the end of the schedule
    /// the last entry repeats.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let index = (retry.max(1) - 1) as usize;
        let ms = self
            .backoff_schedule_ms
            .get(index)
            .or_else(|| self.backoff_schedule_ms.last())
            .copied()
            .unwrap_or(0);
        Duration::from_millis(ms)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number. On exhaustion the last
/// error is returned as-is.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    step: Step,
    recording_id: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_before_retry(attempt - 1)).await;
        }

        info!(
            recording_id = %recording_id,
            step = step.label(),
            attempt,
            max_attempts,
            "Starting {} step",
            step
        );

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_before_retry(attempt);
                warn!(
                    recording_id = %recording_id,
                    step = step.label(),
                    attempt,
                    max_attempts,
                    "{} step failed, retrying in {}ms: {:#}",
                    step,
                    delay.as_millis(),
                    e
                );
                last_err = Some(e);
            }
            Err(e) => {
                error!(
                    recording_id = %recording_id,
                    step = step.label(),
                    attempt,
                    max_attempts,
                    "{} step failed after {} attempts: {:#}",
                    step,
                    attempt,
                    e
                );
                return Err(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("{} step was never attempted", step)))
}
