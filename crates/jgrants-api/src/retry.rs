// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use jgrants_config::model::RetryConfig;
use jgrants_core::JgrantsError;
use tracing::warn;

/// Outcome of classifying a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Terminal,
}

/// Transport failures and 5xx responses are worth another attempt.
/// 4xx responses and undecodable bodies are not.
pub fn default_classification(err: &JgrantsError) -> RetryClass {
    match err {
        JgrantsError::Network { .. } => RetryClass::Retryable,
        JgrantsError::Upstream { status, .. } if *status >= 500 => RetryClass::Retryable,
        _ => RetryClass::Terminal,
    }
}

/// How many times, and how patiently, a logical call is attempted.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first. Never below 1.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub backoff_base: Duration,
    pub classify: fn(&JgrantsError) -> RetryClass,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            classify: default_classification,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
        )
    }

    /// Delay after the failed attempt `attempt` (0-indexed): `base * 2^attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `op` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `op` receives the 0-indexed attempt number. Terminal failures are
    /// returned as-is; exhaustion wraps the last failure in
    /// [`JgrantsError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, JgrantsError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, JgrantsError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if (self.classify)(&err) == RetryClass::Terminal {
                return Err(err);
            }

            let attempts = attempt + 1;
            if attempts >= self.max_attempts {
                return Err(JgrantsError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let delay = self.backoff_for(attempt);
            warn!(
                attempt = attempts,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retryable failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
