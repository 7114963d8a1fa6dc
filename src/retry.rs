// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded Retry Policy
//!
//! Runs an operation until it succeeds, returns an error the classifier marks
//! as [`RetryDecision::Abort`], or exhausts `max_attempts`. Retryable errors
//! consume one attempt each; the last one is surfaced once the bound is hit.
//!
//! The policy has no wall-clock timeout of its own. Waits between attempts
//! observe the caller's [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::SubnetError;

/// Default attempt bound
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total invocations allowed, including the first
    pub max_attempts: u32,
    /// Base delay between attempts (exponential backoff)
    pub base_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay after the given (1-based) failed attempt
    pub(crate) fn delay_after(&self, attempt: u32) -> Duration {
        // Cap the shift to prevent overflow
        let shift = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

/// Classification of an operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
}

/// Retry only on optimistic-concurrency conflicts (subnet creation)
pub fn retry_on_conflict(err: &SubnetError) -> RetryDecision {
    if err.is_conflict() {
        RetryDecision::Retry
    } else {
        RetryDecision::Abort
    }
}

/// Retry on conflicts, locks and pending detachment (subnet deletion)
pub fn retry_on_contention(err: &SubnetError) -> RetryDecision {
    if err.is_contention() {
        RetryDecision::Retry
    } else {
        RetryDecision::Abort
    }
}

/// Cancellation observed between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("retry cancelled after {attempts} attempt(s)")]
pub struct RetryCancelled {
    pub attempts: u32,
}

/// Bounded-retry executor
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation` under the policy
    ///
    /// `operation` receives the 1-based attempt number.
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        cancel: &CancellationToken,
        classify: C,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDecision,
        E: std::fmt::Display + From<RetryCancelled>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == RetryDecision::Abort {
                return Err(err);
            }
            if attempt >= max_attempts {
                warn!(
                    "Giving up after {} attempt(s), last error: {}",
                    attempt, err
                );
                return Err(err);
            }

            let delay = self.config.delay_after(attempt);
            debug!(
                "Attempt {}/{} failed with retryable error: {}; retrying in {:?}",
                attempt, max_attempts, err, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryCancelled { attempts: attempt }.into());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
