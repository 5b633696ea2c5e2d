//! Retry policy for outbound provider requests.

use std::time::Duration;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Delay grows by `base` after every failed attempt: `base * attempt`.
    Linear {
        /// Delay before the first retry.
        base: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            base: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Delay to wait after `failed_attempts` attempts have failed (1-based).
    pub fn delay(self, failed_attempts: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Linear { base } => base.saturating_mul(failed_attempts.max(1)),
        }
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one. Never less than one.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
    /// Non-5xx statuses that are still worth retrying.
    pub retry_on_status: Vec<u16>,
    /// Whether transport failures (connect, timeout, body read) are retried.
    pub retry_on_transport: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429],
            retry_on_transport: true,
        }
    }
}

impl RetryConfig {
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Linear { base },
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// 5xx and the listed statuses are transient; every other failure status is permanent.
    pub fn should_retry_status(&self, status: u16) -> bool {
        (500..600).contains(&status) || self.retry_on_status.contains(&status)
    }

    pub fn delay_for_attempt(&self, failed_attempts: u32) -> Duration {
        self.backoff.delay(failed_attempts)
    }
}
