//! Backoff retry for fallible async operations.
//!
//! Call sites opt in explicitly. The session guard only retries profile lookups;
//! redirects use their own deferred reconciliation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use sf_core::auth::AuthError;
use sf_core::config::AppConfig;
use sf_core::media::UploadValidationError;
use sf_core::ports::{ContentStoreError, ProfileStoreError, StorageError};
use sf_core::profile::ProfileValidationError;

/// Message fragments marking failures that retrying cannot fix.
const PERMANENT_MARKERS: [&str; 4] = ["auth", "validation", "file type", "5mb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to every backoff step.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            jitter: Duration::from_millis(config.retry_jitter_ms),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential step after the failed attempt `attempt` (0-based), capped, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Backoff step plus a random jitter in `[0, jitter]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.backoff(attempt) + jitter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Decides whether a failure is worth another attempt.
pub trait Classify {
    fn failure_class(&self) -> FailureClass;
}

/// Classify by message: auth, validation, file type and size failures are permanent.
pub fn classify_message(message: &str) -> FailureClass {
    let message = message.to_lowercase();
    if PERMANENT_MARKERS.iter().any(|m| message.contains(m)) {
        FailureClass::Permanent
    } else {
        FailureClass::Transient
    }
}

impl Classify for anyhow::Error {
    fn failure_class(&self) -> FailureClass {
        classify_message(&format!("{self:#}"))
    }
}

impl Classify for String {
    fn failure_class(&self) -> FailureClass {
        classify_message(self)
    }
}

impl Classify for AuthError {
    fn failure_class(&self) -> FailureClass {
        if self.is_transient() {
            FailureClass::Transient
        } else {
            FailureClass::Permanent
        }
    }
}

impl Classify for ProfileStoreError {
    fn failure_class(&self) -> FailureClass {
        match self {
            Self::Unavailable(_) => FailureClass::Transient,
            Self::Rejected { status, .. } if *status >= 500 || *status == 429 => {
                FailureClass::Transient
            }
            _ => FailureClass::Permanent,
        }
    }
}

impl Classify for ContentStoreError {
    fn failure_class(&self) -> FailureClass {
        match self {
            Self::Unavailable(_) => FailureClass::Transient,
            Self::Rejected { status, .. } if *status >= 500 || *status == 429 => {
                FailureClass::Transient
            }
            _ => FailureClass::Permanent,
        }
    }
}

impl Classify for StorageError {
    fn failure_class(&self) -> FailureClass {
        match self {
            Self::Unavailable(_) => FailureClass::Transient,
            Self::Rejected { status, .. } if *status >= 500 || *status == 429 => {
                FailureClass::Transient
            }
            _ => FailureClass::Permanent,
        }
    }
}

impl Classify for UploadValidationError {
    fn failure_class(&self) -> FailureClass {
        FailureClass::Permanent
    }
}

impl Classify for ProfileValidationError {
    fn failure_class(&self) -> FailureClass {
        FailureClass::Permanent
    }
}

/// Run `operation` until it succeeds, fails permanently, or the attempt budget runs out.
///
/// Returns the last error once the budget is exhausted. No delay follows the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        attempt += 1;

        if err.failure_class() == FailureClass::Permanent {
            debug!(attempt, error = %err, "permanent failure, not retrying");
            return Err(err);
        }
        if attempt >= max_attempts {
            warn!(attempt, max_attempts, error = %err, "retry budget exhausted");
            return Err(err);
        }

        let delay = policy.delay_for(attempt - 1);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
